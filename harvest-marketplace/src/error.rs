use crate::thumbnail::ThumbnailError;
use harvest_drivers::DriverError;
use harvest_http::HttpError;

/// Why the collection listing did not produce enough links.
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("no category tabs found on {page}")]
    NoCategories { page: String },

    #[error("collected {} of {wanted} collection links after {attempts} scroll passes", .collected.len())]
    Exhausted {
        collected: Vec<String>,
        wanted: usize,
        attempts: u32,
    },
}

/// Why a single collection could not be built or registered.
#[derive(thiserror::Error, Debug)]
pub enum CollectionError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    #[error("failed to encode collection metadata: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("ingestion API accepted the collection but returned no id: {body}")]
    MissingCollectionId { body: String },
}
