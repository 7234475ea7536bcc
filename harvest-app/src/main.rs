use anyhow::Result;
use clap::Parser;
use harvest_common::HarvestError;
use harvest_common::observability::{LogConfig, init_logging};
use harvest_config::{HarvestConfig, HarvestConfigLoader, default_config_path};
use std::path::PathBuf;
use tracing::info;
mod runner;

/// Harvest marketplace collections into the ingestion API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML config file; overrides the platform and working-directory defaults.
    #[arg(short, long, env = "HARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Number of collections to process.
    #[arg(long)]
    collections: Option<usize>,

    /// Upper bound for the per-collection asset count.
    #[arg(long)]
    max_assets: Option<u32>,

    /// Run the browser headless (`true`/`false`).
    #[arg(long)]
    headless: Option<bool>,
}

impl Args {
    fn apply(&self, cfg: &mut HarvestConfig) {
        if let Some(n) = self.collections {
            cfg.harvest.collections = n;
        }
        if let Some(n) = self.max_assets {
            cfg.harvest.max_assets = n;
        }
        if let Some(headless) = self.headless {
            cfg.browser.headless = headless;
        }
    }
}

fn load_config(args: &Args) -> Result<HarvestConfig> {
    let mut loader = HarvestConfigLoader::new();
    if let Some(path) = default_config_path() {
        loader = loader.with_optional_file(path);
    }
    loader = loader.with_optional_file("harvest.yaml");
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }

    let mut cfg = loader.load()?;
    args.apply(&mut cfg);
    cfg.validate().map_err(|e| HarvestError::Config(e.to_string()))?;
    Ok(cfg)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Config (files, then env, then CLI flags)
    let cfg = load_config(&args)?;

    // 2) Logging from the `logging` section
    let log_file = init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        ..LogConfig::default()
    })?;
    info!(target: "harvest", log_file = %log_file.display(), version = ?cfg.version, "starting");

    let report = runner::run(cfg).await?;
    info!(
        target: "harvest",
        created = report.created,
        skipped = report.skipped,
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_config() {
        let mut cfg = HarvestConfigLoader::new()
            .with_yaml_str("harvest: { collections: 5, max_assets: 20, auth_key: k }")
            .load()
            .unwrap();
        let args = Args::try_parse_from([
            "harvest",
            "--collections",
            "2",
            "--headless",
            "false",
        ])
        .unwrap();

        args.apply(&mut cfg);
        assert_eq!(cfg.harvest.collections, 2);
        assert_eq!(cfg.harvest.max_assets, 20);
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn flags_are_optional() {
        let args = Args::try_parse_from(["harvest"]).unwrap();
        assert!(args.collections.is_none());
        assert!(args.headless.is_none());
    }
}
