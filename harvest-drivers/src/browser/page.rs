use crate::browser::{
    behavioral::BehavioralEngine,
    fingerprint::UserAgentProfile,
    session::{BrowserSession, DriverError, SCROLL_TO_BOTTOM_JS},
    stealth::{evasion_scripts, StealthProfile},
};
use async_trait::async_trait;
use fantoccini::{elements::Element, error::CmdError, wd::TimeoutConfiguration, Client, Locator};
use std::time::Duration;
use tracing::debug;

/// WebDriver-backed page implementing [`BrowserSession`].
pub struct HarvestPage {
    pub(crate) client: Client,
    pub(crate) stealth_profile: StealthProfile,
    pub(crate) user_agent: UserAgentProfile,
    pub(crate) behavioral_engine: BehavioralEngine,
}

impl HarvestPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(
        client: Client,
        stealth_profile: StealthProfile,
        user_agent: UserAgentProfile,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth_profile,
            user_agent,
            behavioral_engine,
        }
    }

    async fn apply_evasions(&self) -> Result<(), DriverError> {
        for script in evasion_scripts(self.stealth_profile, &self.user_agent) {
            self.client.execute(&script, vec![]).await.map_err(command_error)?;
        }
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Element, DriverError> {
        self.client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, e))
    }
}

#[async_trait]
impl BrowserSession for HarvestPage {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.behavioral_engine.random_delay(300, 1200).await;
        debug!(target: "browser.page", %url, "navigating");
        self.client.goto(url).await.map_err(command_error)?;
        self.apply_evasions().await
    }

    async fn implicit_wait(&mut self, timeout: Duration) -> Result<(), DriverError> {
        self.client
            .update_timeouts(TimeoutConfiguration::new(None, None, Some(timeout)))
            .await
            .map_err(command_error)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.client
            .execute(SCROLL_TO_BOTTOM_JS, vec![])
            .await
            .map(|_| ())
            .map_err(command_error)
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>, DriverError> {
        self.behavioral_engine.random_delay(100, 500).await;
        let element = self.find(selector).await?;
        element.attr(name).await.map_err(command_error)
    }

    async fn attributes(
        &mut self,
        scope: Option<&str>,
        selector: &str,
        name: &str,
    ) -> Result<Vec<String>, DriverError> {
        let elements = match scope {
            Some(scope) => self
                .find(scope)
                .await?
                .find_all(Locator::Css(selector))
                .await
                .map_err(|e| lookup_error(selector, e))?,
            None => self
                .client
                .find_all(Locator::Css(selector))
                .await
                .map_err(|e| lookup_error(selector, e))?,
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(value) = element.attr(name).await.map_err(command_error)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn text(&mut self, selector: &str) -> Result<String, DriverError> {
        self.behavioral_engine.random_delay(100, 500).await;
        let element = self.find(selector).await?;
        element.text().await.map_err(command_error)
    }

    async fn inner_html(&mut self, selector: &str) -> Result<String, DriverError> {
        let element = self.find(selector).await?;
        element.html(true).await.map_err(command_error)
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(command_error)
    }
}

fn lookup_error(selector: &str, err: CmdError) -> DriverError {
    if err.is_no_such_element() {
        DriverError::not_found(selector)
    } else {
        command_error(err)
    }
}

fn command_error(err: CmdError) -> DriverError {
    DriverError::Command(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantoccini::error::{ErrorStatus, WebDriver};

    #[test]
    fn missing_element_maps_to_not_found() {
        let err = CmdError::Standard(WebDriver::new(ErrorStatus::NoSuchElement, "no such element"));
        assert!(lookup_error("h1", err).is_not_found());
    }

    #[test]
    fn other_webdriver_errors_stay_command_errors() {
        let err = CmdError::Standard(WebDriver::new(ErrorStatus::InvalidSelector, "bad selector"));
        assert!(matches!(lookup_error("h1[", err), DriverError::Command(_)));
    }
}
