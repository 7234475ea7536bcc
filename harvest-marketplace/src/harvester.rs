use crate::assets::AssetHarvester;
use crate::error::{CollectionError, DiscoveryError};
use crate::extract::{or_fallback, read_description, read_item_count};
use crate::model::{pick_item_count, CollectionInfo, CollectionType, CreatedCollection};
use crate::random::{RandomSource, ThreadRandom};
use crate::submit::{created_collection_id, is_created, CollectionSubmitter};
use crate::thumbnail::{Thumbnail, ThumbnailError};
use harvest_common::HarvestError;
use harvest_config::HarvestSettings;
use harvest_drivers::{BrowserSession, DriverError};
use harvest_http::{HttpClient, RawResponse, RequestOpts};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome counters for one [`CollectionHarvester::harvest_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Collection pages visited.
    pub attempted: usize,
    /// Collections the ingestion API accepted.
    pub created: usize,
    /// Collections skipped because scraping or submission failed.
    pub skipped: usize,
    /// Created collections whose asset harvest reported an error.
    pub asset_failures: usize,
}

/// Discovers collection pages, registers them and hands them to an
/// [`AssetHarvester`]. Everything runs sequentially on one browser session.
pub struct CollectionHarvester<S, A> {
    session: S,
    assets: A,
    submitter: CollectionSubmitter,
    http: HttpClient,
    rng: Box<dyn RandomSource>,
    settings: HarvestSettings,
}

impl<S: BrowserSession, A: AssetHarvester> CollectionHarvester<S, A> {
    pub fn new(
        session: S,
        assets: A,
        http: HttpClient,
        submitter: CollectionSubmitter,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            session,
            assets,
            submitter,
            http,
            rng: Box::new(ThreadRandom::new()),
            settings,
        }
    }

    /// Replace the random source, e.g. with a seeded or scripted one.
    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn into_parts(self) -> (S, A) {
        (self.session, self.assets)
    }

    /// Process `settings.collections` collections from one discovery pass.
    ///
    /// Only a failure to reach the listing at all aborts the run; individual
    /// collections that fail are logged and skipped.
    pub async fn harvest_all(&mut self) -> Result<HarvestReport, HarvestError> {
        let urls = match self.discover_collection_urls().await {
            Ok(urls) => urls,
            Err(DiscoveryError::Exhausted {
                collected,
                wanted,
                attempts,
            }) => {
                warn!(
                    target: "harvest.discovery",
                    collected = collected.len(),
                    wanted,
                    attempts,
                    "listing ran dry; continuing with the links found"
                );
                collected
            }
            Err(DiscoveryError::Driver(err)) => return Err(HarvestError::Session(err.to_string())),
            Err(err) => return Err(HarvestError::Discovery(err.to_string())),
        };

        let mut report = HarvestReport::default();
        for url in urls.iter().take(self.settings.collections) {
            report.attempted += 1;
            let created = match self.build_collection(url).await {
                Ok(Some(created)) => created,
                Ok(None) => {
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(target: "harvest.collection", %url, error = %err, "collection skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            report.created += 1;
            if let Err(err) = self.assets.harvest_assets(&mut self.session, &created).await {
                warn!(
                    target: "harvest.assets",
                    collection_id = %created.collection_id,
                    error = %err,
                    "asset harvest failed"
                );
                report.asset_failures += 1;
            }
        }

        info!(
            target: "harvest",
            attempted = report.attempted,
            created = report.created,
            skipped = report.skipped,
            asset_failures = report.asset_failures,
            "harvest finished"
        );
        Ok(report)
    }

    /// Collect at least `settings.collections` distinct collection links from
    /// a randomly chosen category of the explore page.
    pub async fn discover_collection_urls(&mut self) -> Result<Vec<String>, DiscoveryError> {
        let category = self.random_category().await?;
        info!(target: "harvest.discovery", %category, "category selected");
        self.navigate(&category).await?;
        self.random_scroll_down().await?;

        let wanted = self.settings.collections;
        let selector = self.settings.selectors.collection_card.clone();
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for attempt in 1..=self.settings.max_scroll_attempts {
            let base = self.session.current_url().await?;
            for href in self.session.attributes(None, &selector, "href").await? {
                let href = resolve_url(&base, &href);
                if seen.insert(href.clone()) {
                    urls.push(href);
                }
            }
            self.session.scroll_to_bottom().await?;
            debug!(target: "harvest.discovery", attempt, collected = urls.len(), wanted, "scroll pass");
            if urls.len() >= wanted {
                return Ok(urls);
            }
        }

        Err(DiscoveryError::Exhausted {
            collected: urls,
            wanted,
            attempts: self.settings.max_scroll_attempts,
        })
    }

    async fn random_category(&mut self) -> Result<String, DiscoveryError> {
        let explore = self.settings.explore_url.clone();
        self.navigate(&explore).await?;

        let selectors = &self.settings.selectors;
        let tabs = match self
            .session
            .attributes(Some(&selectors.category_list), &selectors.category_link, "href")
            .await
        {
            Ok(tabs) => tabs,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        if tabs.is_empty() {
            return Err(DiscoveryError::NoCategories { page: explore });
        }
        let base = self.session.current_url().await?;
        let picked = &tabs[self.rng.index(tabs.len())];
        Ok(resolve_url(&base, picked))
    }

    async fn random_scroll_down(&mut self) -> Result<(), DriverError> {
        let scrolls = self.rng.range(0, u64::from(self.settings.max_random_scrolls.max(1)));
        for _ in 0..scrolls {
            self.session.scroll_to_bottom().await?;
        }
        self.implicit_wait().await
    }

    /// Scrape one collection page and register it.
    ///
    /// Returns `Ok(None)` when the ingestion API answers with anything but 200.
    pub async fn build_collection(&mut self, url: &str) -> Result<Option<CreatedCollection>, CollectionError> {
        info!(target: "harvest.collection", %url, "visiting collection");
        self.navigate(url).await?;

        let thumbnail = self.fetch_thumbnail().await?;
        let max_item_cnt = self.read_max_item_count().await?;
        let info = self.read_collection_info().await?;

        let resp = self.submit_collection(&thumbnail, &info).await?;
        if !is_created(&resp) {
            warn!(
                target: "harvest.collection",
                collection = %info.name,
                status = resp.status.as_u16(),
                message = %resp.error_message(),
                "collection creation rejected"
            );
            return Ok(None);
        }

        let collection_id = created_collection_id(&resp)?;
        let item_cnt = pick_item_count(self.rng.as_mut(), self.settings.max_assets, max_item_cnt);
        Ok(Some(CreatedCollection {
            info,
            collection_id,
            item_cnt,
        }))
    }

    /// Upload the thumbnail and metadata to the ingestion API.
    pub async fn submit_collection(
        &self,
        thumbnail: &Thumbnail,
        info: &CollectionInfo,
    ) -> Result<RawResponse, CollectionError> {
        self.submitter.submit_collection(thumbnail, info).await
    }

    async fn fetch_thumbnail(&mut self) -> Result<Thumbnail, CollectionError> {
        let selector = &self.settings.selectors.collection_image;
        let src = self
            .session
            .attribute(selector, "src")
            .await?
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ThumbnailError::MissingSource {
                selector: selector.clone(),
            })?;
        let base = self.session.current_url().await?;
        let image_url = resolve_url(&base, &src);
        let resp = self.http.get_bytes(&image_url, RequestOpts::default()).await?;
        Ok(Thumbnail::from_response(&image_url, resp)?)
    }

    async fn read_max_item_count(&mut self) -> Result<u32, DriverError> {
        let selector = self.settings.selectors.item_count.clone();
        let result = read_item_count(&mut self.session, &selector).await;
        or_fallback("item_count", result, self.settings.max_assets)
    }

    async fn read_collection_info(&mut self) -> Result<CollectionInfo, DriverError> {
        let selectors = self.settings.selectors.clone();
        let name = self.session.text(&selectors.collection_name).await?.trim().to_string();
        let description = or_fallback(
            "description",
            read_description(&mut self.session, &selectors.collection_description).await,
            String::new(),
        )?;
        let kind = CollectionType::random(self.rng.as_mut());
        Ok(CollectionInfo::new(name, description, kind))
    }

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.session.goto(url).await?;
        self.implicit_wait().await
    }

    async fn implicit_wait(&mut self) -> Result<(), DriverError> {
        self.session
            .implicit_wait(Duration::from_secs(self.settings.implicit_wait_secs))
            .await
    }
}

/// Resolve a possibly relative link against the page it was read from.
fn resolve_url(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
