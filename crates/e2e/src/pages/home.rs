use tracing::info;
use tripcheck_common::{AgeRange, BookingScenario, SeededRandom};

use super::{maybe_accept_cookies, PageContext};
use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};

const APPLY: &str = ".DropModal__footerContainer .DropModal__apply";

/// Search form on the landing page
pub struct HomePage {
    ctx: PageContext,
}

impl HomePage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    // Airport selection
    fn airport_input(&self) -> Locator {
        Locator::css("[data-test-id=\"airport-input\"]")
    }

    pub fn airports_panel(&self) -> Locator {
        Locator::css(".dropModalScope_airports")
    }

    fn airport_boxes(&self) -> Locator {
        self.airports_panel()
            .locator(".SelectAirports__parentGroup .inputs__CheckboxTextAligned")
    }

    // Destination selection
    fn destination_open(&self) -> Locator {
        Locator::css(".Package__destinations .inputs__children:visible")
    }

    pub fn destination_panel(&self) -> Locator {
        Locator::css(".dropModalScope_destinations")
    }

    pub fn destination_links(&self) -> Locator {
        self.destination_panel()
            .locator(".DestinationsList__link:not(.DestinationsList__disabled)")
    }

    fn destination_parent_checkbox(&self) -> Locator {
        self.destination_panel().locator(
            ".DestinationsList__droplistContainer .DestinationsList__parentCheckbox:visible",
        )
    }

    // Departure date
    fn departure_date_input(&self) -> Locator {
        Locator::css("[data-test-id=\"departure-date-input\"]")
    }

    pub fn departure_date_panel(&self) -> Locator {
        Locator::css(".dropModalScope_Departuredate")
    }

    pub fn available_departure_dates(&self) -> Locator {
        self.departure_date_panel()
            .locator(".SelectLegacyDate__available")
    }

    // Rooms and guests
    fn rooms_guests_input(&self) -> Locator {
        Locator::css("[data-test-id=\"rooms-and-guest-input\"]")
    }

    fn adults_select(&self) -> Locator {
        Locator::css(".AdultSelector__adultSelector select")
    }

    fn children_select(&self) -> Locator {
        Locator::css(".ChildrenSelector__childrenSelector select")
    }

    pub fn child_age_selects(&self) -> Locator {
        Locator::css(".ChildrenAge__childAgeSelector select")
    }

    fn guests_panel(&self) -> Locator {
        Locator::css(".dropModalScope_roomandguest")
    }

    fn search_button(&self) -> Locator {
        Locator::css("[data-test-id=\"search-button\"]")
    }

    pub fn search_results_list(&self) -> Locator {
        Locator::css("[data-test-id=\"search-results-list\"]")
    }

    /// Navigate to the landing page and get rid of the consent banner
    pub async fn open(&self) -> E2eResult<()> {
        self.ctx.goto(&self.ctx.config().base_url).await?;
        maybe_accept_cookies(&self.ctx).await;
        Ok(())
    }

    /// Select the first departure airport group
    pub async fn select_departure_airport(&self) -> E2eResult<String> {
        self.ctx.safe_click(&self.airport_input()).await?;

        let selected = self.airport_boxes().first();
        let airport = self.ctx.text(&selected).await?.trim().to_string();
        self.ctx.safe_click(&selected).await?;
        self.ctx
            .safe_click(&self.airports_panel().locator(APPLY))
            .await?;

        info!("[BOOKING] Departure Airport: {}", airport);
        Ok(airport)
    }

    /// Select a destination picked by `rng` among the enabled ones
    pub async fn select_random_destination(&self, rng: &mut SeededRandom) -> E2eResult<String> {
        self.ctx.safe_click(&self.destination_open()).await?;

        let links = self.destination_links();
        let count = self.ctx.count(&links).await?;
        let picked = links.nth(rng.pick_index(count)?);
        let destination = self.ctx.text(&picked).await?.trim().to_string();
        self.ctx.safe_click(&picked).await?;

        self.ctx
            .safe_click(&self.destination_parent_checkbox())
            .await?;
        self.ctx
            .safe_click(&self.destination_panel().locator(APPLY))
            .await?;

        info!("[BOOKING] Destination: {}", destination);
        Ok(destination)
    }

    /// Select one of the available departure dates, picked by `rng`
    pub async fn select_available_departure_date(
        &self,
        rng: &mut SeededRandom,
    ) -> E2eResult<String> {
        self.ctx.safe_click(&self.departure_date_input()).await?;

        let dates = self.available_departure_dates();
        let count = self.ctx.count(&dates).await?;
        let picked = dates.nth(rng.pick_index(count)?);

        let aria_label = self.ctx.attribute(&picked, "aria-label").await?;
        let label = if aria_label.is_empty() {
            self.ctx.text(&picked).await?
        } else {
            aria_label
        };
        self.ctx.safe_click(&picked).await?;
        self.ctx
            .safe_click(&self.departure_date_panel().locator(APPLY))
            .await?;

        let label = label.trim().to_string();
        info!("[BOOKING] Departure Date: {}", label);
        Ok(label)
    }

    /// Configure guests from `scenario`; returns the picked child ages
    pub async fn set_rooms_and_guests(
        &self,
        scenario: &BookingScenario,
        rng: &mut SeededRandom,
    ) -> E2eResult<Vec<u32>> {
        self.ctx.safe_click(&self.rooms_guests_input()).await?;

        self.ctx
            .select_option(&self.adults_select(), &scenario.adults.to_string())
            .await?;
        self.ctx
            .select_option(&self.children_select(), &scenario.children.to_string())
            .await?;

        let range = scenario
            .child_age_range
            .unwrap_or(self.ctx.config().test_data.child_age_range);

        let mut ages = Vec::with_capacity(scenario.children as usize);
        for child in 0..scenario.children as usize {
            let select = self.child_age_selects().nth(child);
            let candidates = self.child_age_candidates(&select, range).await?;
            if candidates.is_empty() {
                return Err(E2eError::AssertionFailed(format!(
                    "No valid child age options (value >= 0, within {}-{}) for child {}",
                    range.min,
                    range.max,
                    child + 1
                )));
            }

            let age = *rng.pick(&candidates)?;
            self.ctx.select_option(&select, &age.to_string()).await?;
            ages.push(age);
        }

        self.ctx
            .safe_click(&self.guests_panel().locator(APPLY))
            .await?;

        info!(
            "[BOOKING] Guests: {} Adults, {} Child(ren) (ages {:?})",
            scenario.adults, scenario.children, ages
        );
        Ok(ages)
    }

    /// Enabled options of an age select whose value is an age within `range`
    async fn child_age_candidates(&self, select: &Locator, range: AgeRange) -> E2eResult<Vec<u32>> {
        let options = select.locator("option:not([disabled])");
        let count = self.ctx.count(&options).await?;

        let mut ages = Vec::new();
        for i in 0..count {
            let value = self.ctx.attribute(&options.nth(i), "value").await?;
            // Placeholder options carry an empty or negative value
            match value.trim().parse::<u32>() {
                Ok(age) if range.contains(age) => ages.push(age),
                _ => {}
            }
        }
        Ok(ages)
    }

    pub async fn search_holidays(&self) -> E2eResult<()> {
        self.ctx.safe_click(&self.search_button()).await?;
        Ok(())
    }
}
