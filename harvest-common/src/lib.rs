//! Types shared by every harvest crate: the run-level [`HarvestError`], the
//! configurable [`StealthLevel`] and [`LogFormat`], and [`observability`].
//!
//! ```rust
//! use harvest_common::StealthLevel;
//!
//! let level: StealthLevel = serde_json::from_str("\"maximum\"").unwrap();
//! assert_eq!(level, StealthLevel::Maximum);
//! assert_eq!(StealthLevel::default(), StealthLevel::Balanced);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

pub use observability::LogFormat;

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// Failures that end a whole harvest run.
///
/// Per-collection problems are logged and skipped; only these escape.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// The browser session broke before any collection could be visited.
    #[error("browser session failed: {0}")]
    Session(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The listing pages did not expose what discovery needs.
    #[error("collection discovery failed: {0}")]
    Discovery(String),
}
