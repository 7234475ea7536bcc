//! The page surface the harvester drives.
//!
//! Everything the harvester and its downstream collaborators need from a
//! browser goes through [`BrowserSession`], so the WebDriver implementation
//! ([`HarvestPage`](super::page::HarvestPage)) can be swapped for an in-memory
//! page in tests.
use async_trait::async_trait;
use std::time::Duration;

/// JavaScript executed for a scroll-to-bottom action.
pub const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// No element matched the selector.
    #[error("no element matches selector `{selector}`")]
    ElementNotFound { selector: String },

    /// Could not reach or start the WebDriver session.
    #[error("webdriver connection failed: {0}")]
    Connect(String),

    /// The WebDriver rejected or failed a command.
    #[error("webdriver command failed: {0}")]
    Command(String),
}

impl DriverError {
    pub fn not_found(selector: &str) -> Self {
        Self::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    /// True when the error only says that an element was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the session to `url`.
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Set how long element lookups wait for a match before failing.
    async fn implicit_wait(&mut self, timeout: Duration) -> Result<(), DriverError>;

    /// Scroll the document to its bottom to trigger lazy loading.
    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    /// Read `name` from the first element matching `selector`.
    ///
    /// Fails with [`DriverError::ElementNotFound`] when nothing matches; an
    /// element without the attribute yields `Ok(None)`.
    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>, DriverError>;

    /// Read `name` from every element matching `selector`, skipping elements
    /// without it. When `scope` is given the lookup happens under the first
    /// element matching `scope`, which must exist.
    async fn attributes(
        &mut self,
        scope: Option<&str>,
        selector: &str,
        name: &str,
    ) -> Result<Vec<String>, DriverError>;

    /// Visible text of the first element matching `selector`.
    async fn text(&mut self, selector: &str) -> Result<String, DriverError>;

    /// Inner HTML of the first element matching `selector`.
    async fn inner_html(&mut self, selector: &str) -> Result<String, DriverError>;

    /// URL the session currently shows.
    async fn current_url(&mut self) -> Result<String, DriverError>;
}
