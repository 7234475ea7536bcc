use crate::browser::{
    behavioral::BehavioralEngine,
    fingerprint::{session_profile, UserAgentProfile},
    page::HarvestPage,
    session::DriverError,
    stealth::{chrome_arguments, StealthProfile},
};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::info;
use webdriver::capabilities::Capabilities;

/// Connection settings for [`HarvestDriver::connect`].
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// WebDriver endpoint, e.g. a local Chromedriver.
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth_profile: StealthProfile,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            stealth_profile: StealthProfile::Balanced,
        }
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client with stealth and
/// behavioral helpers.
pub struct HarvestDriver {
    client: Client,
    user_agent: UserAgentProfile,
    stealth_profile: StealthProfile,
}

impl HarvestDriver {
    /// Create a new driver connected to a running WebDriver service.
    pub async fn connect(options: &DriverOptions) -> Result<Self, DriverError> {
        let user_agent = session_profile();
        let caps = chrome_capabilities(options.stealth_profile, &user_agent, options.headless);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .map_err(|e| DriverError::Connect(format!("{}: {e}", options.webdriver_url)))?;

        info!(
            target: "browser.driver",
            webdriver_url = %options.webdriver_url,
            headless = options.headless,
            profile = ?options.stealth_profile,
            "webdriver session started"
        );

        Ok(Self {
            client,
            user_agent,
            stealth_profile: options.stealth_profile,
        })
    }

    /// Page handle sharing this driver's WebDriver session.
    pub fn page(&self) -> HarvestPage {
        HarvestPage::new(
            self.client.clone(),
            self.stealth_profile,
            self.user_agent,
            BehavioralEngine::new(),
        )
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<(), DriverError> {
        self.client
            .close()
            .await
            .map_err(|e| DriverError::Command(e.to_string()))
    }
}

fn chrome_capabilities(
    profile: StealthProfile,
    user_agent: &UserAgentProfile,
    headless: bool,
) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": chrome_arguments(profile, user_agent, headless),
            "excludeSwitches": ["enable-automation"],
        }),
    );
    caps
}
