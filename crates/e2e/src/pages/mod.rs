//! Page objects for the booking funnel

mod flights;
mod home;
mod hotel;
mod passenger;
mod results;

pub use flights::FlightsPage;
pub use home::HomePage;
pub use hotel::HotelDetailsPage;
pub use passenger::{FieldCheck, PassengerDetailsPage, ValidationReport};
pub use results::ResultsPage;

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tripcheck_common::SuiteConfig;

use crate::browser::{Element, Locator, PageDriver, WaitState};
use crate::error::E2eResult;
use crate::interaction::{act_on, ActOptions, ActReport, BestEffort, DEFAULT_SCROLL_TIMEOUT};

/// How long a consent button gets to show up before we move on
const CONSENT_WAIT: Duration = Duration::from_secs(1);

/// Driver plus configuration shared by every page object
#[derive(Clone)]
pub struct PageContext {
    driver: Arc<dyn PageDriver>,
    config: Arc<SuiteConfig>,
}

impl PageContext {
    pub fn new(driver: Arc<dyn PageDriver>, config: Arc<SuiteConfig>) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn element(&self, locator: &Locator) -> Element {
        Element::new(self.driver.clone(), locator.clone())
            .with_click_timeout(self.config.timeouts.action())
    }

    /// Scroll, wait for visibility and click with the configured action timeout
    pub async fn safe_click(&self, locator: &Locator) -> E2eResult<ActReport> {
        self.safe_click_within(locator, self.config.timeouts.action())
            .await
    }

    pub async fn safe_click_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> E2eResult<ActReport> {
        let options = ActOptions {
            timeout,
            scroll_timeout: DEFAULT_SCROLL_TIMEOUT,
            scroll_first: true,
        };
        act_on(&self.element(locator), &options).await
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        self.driver
            .goto(url, self.config.timeouts.navigation())
            .await
    }

    /// Text content, empty when the node has none
    pub async fn text(&self, locator: &Locator) -> E2eResult<String> {
        Ok(self
            .driver
            .text_content(locator)
            .await?
            .unwrap_or_default())
    }

    /// Attribute value, empty when absent
    pub async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<String> {
        Ok(self
            .driver
            .get_attribute(locator, name)
            .await?
            .unwrap_or_default())
    }

    pub async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.driver.count(locator).await
    }

    pub async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> E2eResult<bool> {
        self.driver
            .wait_for(locator, WaitState::Visible, timeout)
            .await
    }

    pub async fn select_option(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.driver
            .select_option(locator, value, self.config.timeouts.action())
            .await
    }
}

/// Consent buttons in the order they are tried: the configured accessible
/// names, then the CSS fallback
pub fn consent_buttons(config: &SuiteConfig) -> Vec<Locator> {
    let selectors = &config.selectors;
    let mut buttons: Vec<Locator> = selectors
        .consent_button_patterns
        .iter()
        .map(|pattern| Locator::role("button", pattern))
        .collect();
    if !selectors.cookie_accept_button.is_empty() {
        buttons.push(Locator::css(&selectors.cookie_accept_button));
    }
    buttons
}

/// Dismiss a cookie banner if one is showing. Never fails.
pub async fn maybe_accept_cookies(ctx: &PageContext) -> BestEffort {
    let mut outcome = BestEffort::Skipped;

    for button in consent_buttons(ctx.config()) {
        match ctx.wait_visible(&button, CONSENT_WAIT).await {
            Ok(true) => match ctx.driver().click(&button, CONSENT_WAIT).await {
                Ok(()) => {
                    debug!("Accepted cookies via {}", button);
                    return BestEffort::Done;
                }
                Err(e) => {
                    debug!("[maybe_accept_cookies] click on {} failed: {}", button, e);
                    outcome = BestEffort::FailedIgnored(e.to_string());
                }
            },
            Ok(false) => debug!("[maybe_accept_cookies] no banner matching {}", button),
            Err(e) => {
                debug!("[maybe_accept_cookies] lookup of {} failed: {}", button, e);
                outcome = BestEffort::FailedIgnored(e.to_string());
            }
        }
    }

    outcome
}
