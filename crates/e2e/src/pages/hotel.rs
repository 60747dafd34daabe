use super::PageContext;
use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};

pub struct HotelDetailsPage {
    ctx: PageContext,
}

impl HotelDetailsPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    pub fn overview_container(&self) -> Locator {
        Locator::css("#headerContainer__component")
    }

    fn continue_button(&self) -> Locator {
        Locator::css(".ProgressbarNavigation__summaryButton")
    }

    /// Wait for the hotel overview to render
    pub async fn wait_until_loaded(&self) -> E2eResult<()> {
        let container = self.overview_container();
        let timeout = self.ctx.config().timeouts.page_load();
        if self.ctx.wait_visible(&container, timeout).await? {
            Ok(())
        } else {
            Err(E2eError::VisibilityTimeout {
                target: container.to_string(),
                timeout,
            })
        }
    }

    pub async fn continue_from_hotel_details(&self) -> E2eResult<()> {
        self.ctx.safe_click(&self.continue_button()).await?;
        Ok(())
    }
}
