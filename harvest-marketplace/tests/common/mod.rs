//! In-memory marketplace used by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use harvest_config::{HarvestSettings, SelectorSettings};
use harvest_drivers::{BrowserSession, DriverError};
use std::collections::HashMap;
use std::time::Duration;

pub const EXPLORE: &str = "https://market.test/explore-collections";
pub const CATEGORY: &str = "https://market.test/explore-collections?tab=art";

/// Smallest valid PNG header; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

#[derive(Debug, Default, Clone)]
pub struct FakePage {
    /// `(selector, attribute)` to values, in document order.
    pub attrs: HashMap<(String, String), Vec<String>>,
    pub text: HashMap<String, String>,
    pub html: HashMap<String, String>,
    /// Collection card links revealed `batch` at a time per scroll.
    pub cards: Vec<String>,
    pub batch: usize,
}

impl FakePage {
    pub fn with_attr(mut self, selector: &str, name: &str, values: &[&str]) -> Self {
        self.attrs.insert(
            (selector.to_string(), name.to_string()),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.text.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_html(mut self, selector: &str, html: &str) -> Self {
        self.html.insert(selector.to_string(), html.to_string());
        self
    }

    pub fn with_cards(mut self, cards: Vec<String>, batch: usize) -> Self {
        self.cards = cards;
        self.batch = batch;
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub pages: HashMap<String, FakePage>,
    pub current: String,
    pub visited: Vec<String>,
    pub scrolls_here: usize,
    pub total_scrolls: usize,
    pub waits: Vec<Duration>,
    pub card_selector: String,
}

impl FakeSession {
    pub fn new(card_selector: &str) -> Self {
        Self {
            card_selector: card_selector.to_string(),
            ..Default::default()
        }
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    fn here(&self) -> Result<&FakePage, DriverError> {
        self.pages
            .get(&self.current)
            .ok_or_else(|| DriverError::Command(format!("no page at {}", self.current)))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.current = url.to_string();
        self.visited.push(url.to_string());
        self.scrolls_here = 0;
        Ok(())
    }

    async fn implicit_wait(&mut self, timeout: Duration) -> Result<(), DriverError> {
        self.waits.push(timeout);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.scrolls_here += 1;
        self.total_scrolls += 1;
        Ok(())
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>, DriverError> {
        let page = self.here()?;
        match page.attrs.get(&(selector.to_string(), name.to_string())) {
            Some(values) => Ok(values.first().cloned()),
            None if page.text.contains_key(selector) || page.html.contains_key(selector) => Ok(None),
            None => Err(DriverError::not_found(selector)),
        }
    }

    async fn attributes(
        &mut self,
        scope: Option<&str>,
        selector: &str,
        name: &str,
    ) -> Result<Vec<String>, DriverError> {
        let page = self.here()?;
        if scope.is_none() && selector == self.card_selector && name == "href" {
            let visible = page.batch * (self.scrolls_here + 1);
            return Ok(page.cards.iter().take(visible).cloned().collect());
        }
        let key = match scope {
            Some(scope) => {
                let prefix = format!("{scope} ");
                if !page.attrs.keys().any(|(sel, _)| sel.starts_with(&prefix)) {
                    return Err(DriverError::not_found(scope));
                }
                format!("{prefix}{selector}")
            }
            None => selector.to_string(),
        };
        Ok(page
            .attrs
            .get(&(key, name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn text(&mut self, selector: &str) -> Result<String, DriverError> {
        self.here()?
            .text
            .get(selector)
            .cloned()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn inner_html(&mut self, selector: &str) -> Result<String, DriverError> {
        self.here()?
            .html
            .get(selector)
            .cloned()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.current.clone())
    }
}

pub fn settings(collections: usize, max_assets: u32, api_url: &str) -> HarvestSettings {
    serde_json::from_value(serde_json::json!({
        "collections": collections,
        "max_assets": max_assets,
        "auth_key": "test-key",
        "collection_api_url": api_url,
        "explore_url": EXPLORE,
        "implicit_wait_secs": 1,
        "max_random_scrolls": 10,
        "max_scroll_attempts": 20,
    }))
    .expect("valid settings")
}

/// Explore page with one category tab plus a category listing of `cards`.
pub fn marketplace(cards: &[&str], batch: usize) -> FakeSession {
    let sel = SelectorSettings::default();
    let scoped = format!("{} {}", sel.category_list, sel.category_link);
    FakeSession::new(&sel.collection_card)
        .page(
            EXPLORE,
            FakePage::default().with_attr(&scoped, "href", &["/explore-collections?tab=art"]),
        )
        .page(
            CATEGORY,
            FakePage::default().with_cards(cards.iter().map(|c| c.to_string()).collect(), batch),
        )
}

/// A collection page whose image lives at `image_url`.
pub fn collection_page(name: &str, description: Option<&str>, count_html: Option<&str>, image_url: &str) -> FakePage {
    let sel = SelectorSettings::default();
    let mut page = FakePage::default()
        .with_attr(&sel.collection_image, "src", &[image_url])
        .with_text(&sel.collection_name, name);
    if let Some(description) = description {
        page = page.with_text(&sel.collection_description, description);
    }
    if let Some(count) = count_html {
        page = page.with_html(&sel.item_count, count);
    }
    page
}

/// Keeps every collection it is handed; optionally fails each call.
#[derive(Debug, Default)]
pub struct RecordingAssets {
    pub received: Vec<harvest_marketplace::CreatedCollection>,
    pub fail: bool,
}

#[async_trait]
impl harvest_marketplace::AssetHarvester for RecordingAssets {
    async fn harvest_assets(
        &mut self,
        _session: &mut dyn BrowserSession,
        collection: &harvest_marketplace::CreatedCollection,
    ) -> anyhow::Result<()> {
        self.received.push(collection.clone());
        if self.fail {
            anyhow::bail!("asset page unavailable");
        }
        Ok(())
    }
}
