use anyhow::{Context, Result};
use harvest_config::HarvestConfig;
use harvest_drivers::{DriverOptions, HarvestDriver};
use harvest_http::HttpClient;
use harvest_marketplace::{CollectionHarvester, CollectionSubmitter, HarvestReport, LogOnlyAssetHarvester};
use tracing::{info, warn};

/// Connect the browser, run one harvest pass and close the session again.
pub async fn run(cfg: HarvestConfig) -> Result<HarvestReport> {
    let api_url = cfg
        .harvest
        .resolved_api_url()
        .context("no ingestion endpoint configured")?;
    let http = HttpClient::new()?;
    let submitter = CollectionSubmitter::new(http.clone(), api_url, cfg.harvest.auth_key.clone());
    info!(target: "harvest", endpoint = submitter.endpoint(), "ingestion endpoint resolved");

    let options = DriverOptions {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        headless: cfg.browser.headless,
        stealth_profile: cfg.browser.stealth.into(),
    };
    let driver = HarvestDriver::connect(&options)
        .await
        .context("failed to start browser session")?;

    let mut harvester = CollectionHarvester::new(
        driver.page(),
        LogOnlyAssetHarvester::default(),
        http,
        submitter,
        cfg.harvest,
    );
    let outcome = harvester.harvest_all().await;

    if let Err(err) = driver.close().await {
        warn!(target: "harvest", error = %err, "browser session did not close cleanly");
    }

    let report = outcome?;
    let (_, assets) = harvester.into_parts();
    info!(target: "harvest", handed_off = assets.handed_off(), "asset harvests requested");
    Ok(report)
}
