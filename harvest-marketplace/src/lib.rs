//! Marketplace collection harvesting.
//!
//! [`CollectionHarvester`] walks a marketplace's collection listing through a
//! [`BrowserSession`](harvest_drivers::BrowserSession), scrapes each
//! collection's thumbnail and metadata, registers the collection with the
//! ingestion API as a multipart upload and hands every created collection to
//! an [`AssetHarvester`].
//!
//! - [`model`]: collection metadata before and after registration
//! - [`random`]: injectable randomness for category, scroll and count choices
//! - [`extract`]: DOM field readers with typed absent/malformed errors
//! - [`thumbnail`]: image download and format detection
//! - [`submit`]: the multipart upload to the ingestion API
//! - [`harvester`]: the end-to-end loop
pub mod assets;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod model;
pub mod random;
pub mod submit;
pub mod thumbnail;

pub use assets::{AssetHarvester, LogOnlyAssetHarvester};
pub use error::{CollectionError, DiscoveryError};
pub use harvester::{CollectionHarvester, HarvestReport};
pub use model::{CollectionInfo, CollectionType, CreatedCollection};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use submit::CollectionSubmitter;
pub use thumbnail::{ImageFormat, Thumbnail};
