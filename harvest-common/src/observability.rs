//! Process-wide `tracing` setup for the harvester.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "HARVEST_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// File name prefix and data-dir subdirectory.
    pub app_name: &'static str,
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "harvest",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: a daily rolling file under the resolved log
/// directory, plus `stderr` when asked for. `RUST_LOG` overrides
/// [`LogConfig::default_filter`].
///
/// Returns today's log file path. Repeated calls return the first path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let prefix = format!("{}.log", config.app_name);
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &prefix));

    let mut layers: Vec<BoxedLayer> = vec![file_layer(config.format, writer)];
    if config.emit_stderr {
        layers.push(stderr_layer(config.format));
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
    let _ = LOG_GUARD.set(guard);

    // rolling::daily names files `<prefix>.<yyyy-mm-dd>` in UTC
    let path = dir.join(format!("{prefix}.{}", Utc::now().format("%Y-%m-%d")));
    tracing::info!(target: "harvest.logging", path = %path.display(), format = ?config.format, "logging initialised");
    Ok(LOG_PATH.get_or_init(|| path).clone())
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

/// Explicit dir, then `HARVEST_LOG_DIR`, then `<data_local_dir>/<app>`.
fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from))
        .map(|dir| expand_home(&dir))
        .unwrap_or_else(|| default_data_dir(app_name))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(app_name))
        .unwrap_or_else(|| Path::new(".").join(app_name))
}
