use std::time::Duration;

use super::PageContext;
use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};

/// Continuing recalculates the package price before navigating
const CONTINUE_TIMEOUT: Duration = Duration::from_secs(20);

pub struct FlightsPage {
    ctx: PageContext,
}

impl FlightsPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    pub fn summary_container(&self) -> Locator {
        Locator::css(".ContainerWithRiteSideHolidaySummary")
    }

    fn continue_button(&self) -> Locator {
        Locator::css(
            ".ProgressbarNavigation__container .ProgressbarNavigation__summaryButton:visible",
        )
    }

    pub async fn wait_until_loaded(&self) -> E2eResult<()> {
        let summary = self.summary_container();
        let timeout = self.ctx.config().timeouts.page_load();
        if self.ctx.wait_visible(&summary, timeout).await? {
            Ok(())
        } else {
            Err(E2eError::VisibilityTimeout {
                target: summary.to_string(),
                timeout,
            })
        }
    }

    /// Keep the preselected flights and move on to passenger details
    pub async fn select_available_flights_and_continue(&self) -> E2eResult<()> {
        self.ctx
            .safe_click_within(&self.continue_button(), CONTINUE_TIMEOUT)
            .await?;
        Ok(())
    }
}
