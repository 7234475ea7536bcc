//! Loader for harvester configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files or inline snippets, then
//! `HARVEST__`-prefixed environment variables (`__` separates nesting, so
//! `HARVEST__HARVEST__COLLECTIONS=3` overrides `harvest.collections`).
//! String values may reference `${VAR}` placeholders which are expanded
//! after merging.
use config::{Config, ConfigError, Environment, File};
use harvest_common::{LogFormat, StealthLevel};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Environment variable consulted when `harvest.collection_api_url` is unset.
pub const COLLECTION_API_URL_ENV: &str = "COLLECTION_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    pub version: Option<String>,
    pub harvest: HarvestSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// What to harvest and where to send it.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestSettings {
    /// Number of collections to process per run.
    pub collections: usize,
    /// Ceiling for the per-collection asset count.
    pub max_assets: u32,
    /// Bearer token for the ingestion API.
    pub auth_key: String,
    #[serde(default)]
    pub collection_api_url: Option<String>,
    #[serde(default = "default_explore_url")]
    pub explore_url: String,
    #[serde(default = "default_implicit_wait_secs")]
    pub implicit_wait_secs: u64,
    /// Exclusive upper bound of the random pre-scroll count.
    #[serde(default = "default_max_random_scrolls")]
    pub max_random_scrolls: u32,
    /// Query/scroll passes allowed while collecting collection links.
    #[serde(default = "default_max_scroll_attempts")]
    pub max_scroll_attempts: u32,
    #[serde(default)]
    pub selectors: SelectorSettings,
}

/// CSS selectors for the marketplace pages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    pub category_list: String,
    pub category_link: String,
    pub collection_card: String,
    pub collection_image: String,
    pub item_count: String,
    pub collection_name: String,
    pub collection_description: String,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            category_list: "#main ul".into(),
            category_link: "li > a".into(),
            collection_card: "a.CarouselCard--main".into(),
            collection_image: ".CollectionHeader--collection-image > img".into(),
            item_count: ".CollectionStatsBar--bottom-bordered div[tabIndex=\"-1\"]".into(),
            collection_name: "h1".into(),
            collection_description: ".CollectionHeader--description > span".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth: StealthLevel,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            stealth: StealthLevel::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            dir: None,
        }
    }
}

fn default_explore_url() -> String {
    "https://opensea.io/explore-collections".into()
}
fn default_implicit_wait_secs() -> u64 {
    5
}
fn default_max_random_scrolls() -> u32 {
    10
}
fn default_max_scroll_attempts() -> u32 {
    50
}

fn unexpanded(s: &str) -> bool {
    s.contains("${")
}

impl HarvestSettings {
    /// Ingestion endpoint: the configured value, else `COLLECTION_API_URL`.
    pub fn resolved_api_url(&self) -> Option<String> {
        self.collection_api_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !unexpanded(s))
            .map(str::to_string)
            .or_else(|| {
                std::env::var(COLLECTION_API_URL_ENV)
                    .ok()
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

impl HarvestConfig {
    /// Reject settings the harvester cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let h = &self.harvest;
        if h.collections == 0 {
            return Err(ConfigError::Message(
                "harvest.collections must be greater than zero".into(),
            ));
        }
        if h.max_assets == 0 {
            return Err(ConfigError::Message(
                "harvest.max_assets must be greater than zero".into(),
            ));
        }
        if h.auth_key.trim().is_empty() || unexpanded(&h.auth_key) {
            return Err(ConfigError::Message(
                "harvest.auth_key is empty or references an unset variable".into(),
            ));
        }
        if h.max_scroll_attempts == 0 {
            return Err(ConfigError::Message(
                "harvest.max_scroll_attempts must be greater than zero".into(),
            ));
        }
        if h.resolved_api_url().is_none() {
            return Err(ConfigError::Message(format!(
                "no ingestion endpoint: set harvest.collection_api_url or {COLLECTION_API_URL_ENV}"
            )));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Platform config location: `<config_dir>/harvest/harvest.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("harvest").join("harvest.yaml"))
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct HarvestConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HarvestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestConfigLoader {
    /// Start an empty loader; add files or snippets before loading.
    ///
    /// ```
    /// use harvest_config::HarvestConfigLoader;
    ///
    /// let config = HarvestConfigLoader::new()
    ///     .with_yaml_str("harvest: { collections: 2, max_assets: 10, auth_key: k }")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.harvest.collections, 2);
    /// assert_eq!(config.harvest.implicit_wait_secs, 5);
    /// assert!(config.browser.headless);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be missing, so deployments can rely on env only.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use harvest_config::HarvestConfigLoader;
    ///
    /// temp_env::with_var("INGEST_TOKEN", Some("from-env"), || {
    ///     let config = HarvestConfigLoader::new()
    ///         .with_yaml_str(r#"
    /// harvest:
    ///   collections: 1
    ///   max_assets: 5
    ///   auth_key: "${INGEST_TOKEN}"
    /// "#)
    ///         .load()
    ///         .expect("valid configuration");
    ///     assert_eq!(config.harvest.auth_key, "from-env");
    /// });
    /// ```
    pub fn load(self) -> Result<HarvestConfig, ConfigError> {
        // Added last so environment overrides win over files.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("HARVEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINIMAL: &str = r#"
harvest:
  collections: 3
  max_assets: 20
  auth_key: "secret"
  collection_api_url: "https://ingest.example.com/collections"
"#;

    fn minimal() -> HarvestConfig {
        HarvestConfigLoader::new().with_yaml_str(MINIMAL).load().unwrap()
    }

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_HARVEST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_HARVEST}"));
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let cfg = minimal();
        assert_eq!(cfg.harvest.explore_url, "https://opensea.io/explore-collections");
        assert_eq!(cfg.harvest.max_random_scrolls, 10);
        assert_eq!(cfg.harvest.max_scroll_attempts, 50);
        assert_eq!(cfg.harvest.selectors, SelectorSettings::default());
        assert_eq!(cfg.browser.stealth, StealthLevel::Balanced);
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_selector_override_keeps_other_defaults() {
        let cfg = HarvestConfigLoader::new()
            .with_yaml_str(MINIMAL)
            .with_yaml_str("harvest: { selectors: { collection_name: 'h1.title' } }")
            .load()
            .unwrap();
        assert_eq!(cfg.harvest.selectors.collection_name, "h1.title");
        assert_eq!(cfg.harvest.selectors.category_list, "#main ul");
    }

    #[test]
    fn validate_rejects_zero_collections() {
        let mut cfg = minimal();
        cfg.harvest.collections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unexpanded_auth_key() {
        let mut cfg = minimal();
        cfg.harvest.auth_key = "${HARVEST_UNSET_TOKEN}".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn api_url_falls_back_to_env() {
        let mut cfg = minimal();
        cfg.harvest.collection_api_url = Some("${COLLECTION_API_URL}".into());
        temp_env::with_var(COLLECTION_API_URL_ENV, Some("https://env.example.com/c"), || {
            assert_eq!(
                cfg.harvest.resolved_api_url().as_deref(),
                Some("https://env.example.com/c")
            );
        });
        temp_env::with_var_unset(COLLECTION_API_URL_ENV, || {
            assert!(cfg.harvest.resolved_api_url().is_none());
            assert!(cfg.validate().is_err());
        });
    }

    #[test]
    fn default_config_path_is_namespaced() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("harvest/harvest.yaml"));
        }
    }
}
