use std::time::Duration;
use tracing::{info, warn};

use super::PageContext;
use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};

/// Search results are fetched after the search page navigates
const RESULTS_TIMEOUT: Duration = Duration::from_secs(20);

const UNKNOWN_HOTEL: &str = "Unknown Hotel";

pub struct ResultsPage {
    ctx: PageContext,
}

impl ResultsPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    pub fn results_list(&self) -> Locator {
        Locator::css("[data-test-id=\"search-results-list\"]")
    }

    pub fn first_result(&self) -> Locator {
        self.results_list()
            .locator("[data-test-id=\"result-item\"]")
            .first()
    }

    /// Wait for the list, then for its first entry
    pub async fn wait_until_loaded(&self) -> E2eResult<()> {
        let list = self.results_list();
        if !self.ctx.wait_visible(&list, RESULTS_TIMEOUT).await? {
            return Err(E2eError::VisibilityTimeout {
                target: list.to_string(),
                timeout: RESULTS_TIMEOUT,
            });
        }

        let first = self.first_result();
        let timeout = self.ctx.config().timeouts.expect();
        if !self.ctx.wait_visible(&first, timeout).await? {
            return Err(E2eError::VisibilityTimeout {
                target: first.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    /// Open the first hotel in the results; returns its name
    pub async fn open_first_available_hotel(&self) -> E2eResult<String> {
        self.wait_until_loaded().await?;

        let first = self.first_result();
        let hotel_name = match self
            .ctx
            .text(&first.locator("[data-test-id=\"hotel-name\"]"))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => UNKNOWN_HOTEL.to_string(),
            Err(e) => {
                warn!("Hotel name unreadable: {}", e);
                UNKNOWN_HOTEL.to_string()
            }
        };

        // Identical continue buttons are cloned into hidden containers; only the visible one is unique
        let continue_button = first.locator(
            "div.ResultsListItem__continue button[data-test-id=\"continue-button\"]:visible",
        );
        self.ctx.safe_click(&continue_button).await?;

        info!("[BOOKING] Hotel Selected: {}", hotel_name);
        Ok(hotel_name)
    }
}
