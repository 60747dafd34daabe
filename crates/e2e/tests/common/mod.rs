//! In-memory page used by the integration tests
//!
//! Nodes are keyed by the rendered locator chain. A trailing `nth=` segment
//! resolves against the node registered for the rest of the chain.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use tripcheck_common::{PassengerSection, SuiteConfig};
use tripcheck_e2e::browser::Segment;
use tripcheck_e2e::pages::{PageContext, PassengerDetailsPage};
use tripcheck_e2e::{E2eError, E2eResult, Locator, PageDriver, WaitState};

const FAKE_POLL: Duration = Duration::from_millis(50);

pub const ANY_ERROR: &str = "[id$=\"__errorMessage\"]:visible";
pub const PAX_CONTINUE: &str =
    "#PassengerV2ContinueButton__component .ContinueButtonV2__continue:visible button";

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub count: usize,
    pub visible: bool,
    pub texts: Vec<String>,
    pub attributes: HashMap<String, Vec<String>>,
    pub visible_at: Option<Instant>,
}

impl FakeNode {
    pub fn visible() -> Self {
        Self {
            count: 1,
            visible: true,
            ..Default::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            count: 1,
            visible: false,
            ..Default::default()
        }
    }

    /// One visible node per text
    pub fn list(texts: &[&str]) -> Self {
        Self {
            count: texts.len(),
            visible: true,
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.texts = vec![text.to_string()];
        self
    }

    /// Per-index attribute values; grows the node count to match
    pub fn attribute(mut self, name: &str, values: &[&str]) -> Self {
        self.count = self.count.max(values.len());
        self.attributes.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    fn is_shown(&self) -> bool {
        self.count > 0
            && self.visible
            && self.visible_at.map_or(true, |at| Instant::now() >= at)
    }
}

/// What a click changes on the page
#[derive(Debug, Clone)]
pub enum Effect {
    /// Insert or replace a node, visible after `delay`
    Insert {
        key: String,
        node: FakeNode,
        delay: Duration,
    },
    Remove(String),
}

#[derive(Debug)]
struct Trigger {
    key: String,
    on_click: u32,
    effects: Vec<Effect>,
}

#[derive(Default)]
struct PageState {
    nodes: HashMap<String, FakeNode>,
    triggers: Vec<Trigger>,
    clicks: HashMap<String, u32>,
    selected: HashMap<String, String>,
    visited: Vec<String>,
    fail_scroll: bool,
}

/// Resolved view of a single locator
struct View {
    count: usize,
    shown: bool,
    text: Option<String>,
    attributes: HashMap<String, String>,
}

#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<PageState>,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: &str, node: FakeNode) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(key.to_string(), node);
    }

    pub fn remove(&self, key: &str) {
        self.state.lock().unwrap().nodes.remove(key);
    }

    /// Apply `effects` when `key` receives its `on_click`-th click
    pub fn on_click(&self, key: &str, on_click: u32, effects: Vec<Effect>) {
        self.state.lock().unwrap().triggers.push(Trigger {
            key: key.to_string(),
            on_click,
            effects,
        });
    }

    pub fn fail_scroll(&self) {
        self.state.lock().unwrap().fail_scroll = true;
    }

    pub fn clicks(&self, key: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .clicks
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn selected(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().selected.get(key).cloned()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    fn view(&self, locator: &Locator) -> Option<View> {
        let state = self.state.lock().unwrap();
        let key = locator.to_string();

        if let Some(node) = state.nodes.get(&key) {
            return Some(View {
                count: node.count,
                shown: node.is_shown(),
                text: node.texts.first().cloned(),
                attributes: attributes_at(node, 0),
            });
        }

        let segments = locator.segments();
        let (last, parent) = segments.split_last()?;
        let parent_key = parent
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(" >> ");
        let node = state.nodes.get(&parent_key)?;
        let index = match last {
            Segment::Nth { index } => *index,
            Segment::Last => node.count.checked_sub(1)?,
            _ => return None,
        };
        if index >= node.count {
            return None;
        }

        Some(View {
            count: 1,
            shown: node.is_shown(),
            text: node
                .texts
                .get(index)
                .or_else(|| node.texts.first())
                .cloned(),
            attributes: attributes_at(node, index),
        })
    }

    fn not_found(locator: &Locator) -> E2eError {
        E2eError::Playwright(format!("no element matches {}", locator))
    }
}

fn attributes_at(node: &FakeNode, index: usize) -> HashMap<String, String> {
    node.attributes
        .iter()
        .filter_map(|(name, values)| {
            values
                .get(index)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect()
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str, _timeout: Duration) -> E2eResult<()> {
        self.state.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .visited
            .last()
            .cloned()
            .unwrap_or_default())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok("Fake holidays".to_string())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(self.view(locator).map_or(0, |v| v.count))
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.view(locator).map_or(false, |v| v.shown))
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<bool> {
        let start = Instant::now();
        loop {
            let view = self.view(locator);
            let reached = match state {
                WaitState::Visible => view.as_ref().map_or(false, |v| v.shown),
                WaitState::Hidden => view.as_ref().map_or(true, |v| !v.shown),
                WaitState::Attached => view.is_some(),
                WaitState::Detached => view.is_none(),
            };
            if reached {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(FAKE_POLL).await;
        }
    }

    async fn scroll_into_view(&self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
        if self.state.lock().unwrap().fail_scroll {
            return Err(E2eError::Playwright("element is detached".to_string()));
        }
        self.view(locator)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(locator))
    }

    async fn click(&self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
        let view = self.view(locator).ok_or_else(|| Self::not_found(locator))?;
        if view.count > 1 {
            return Err(E2eError::Playwright(format!(
                "strict mode violation: {} resolved to {} elements",
                locator, view.count
            )));
        }
        if !view.shown {
            return Err(E2eError::Playwright(format!("{} is not visible", locator)));
        }

        let key = locator.to_string();
        let mut state = self.state.lock().unwrap();
        let clicks = {
            let entry = state.clicks.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let effects: Vec<Effect> = state
            .triggers
            .iter()
            .filter(|t| t.key == key && t.on_click == clicks)
            .flat_map(|t| t.effects.clone())
            .collect();
        for effect in effects {
            match effect {
                Effect::Insert {
                    key,
                    mut node,
                    delay,
                } => {
                    if !delay.is_zero() {
                        node.visible_at = Some(Instant::now() + delay);
                    }
                    state.nodes.insert(key, node);
                }
                Effect::Remove(key) => {
                    state.nodes.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.view(locator)
            .map(|v| v.text)
            .ok_or_else(|| Self::not_found(locator))
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.view(locator)
            .map(|v| v.attributes.get(name).cloned())
            .ok_or_else(|| Self::not_found(locator))
    }

    async fn select_option(
        &self,
        locator: &Locator,
        value: &str,
        _timeout: Duration,
    ) -> E2eResult<()> {
        self.view(locator).ok_or_else(|| Self::not_found(locator))?;
        self.state
            .lock()
            .unwrap()
            .selected
            .insert(locator.to_string(), value.to_string());
        Ok(())
    }
}

pub fn context(driver: Arc<FakeDriver>) -> PageContext {
    context_with(driver, SuiteConfig::default())
}

pub fn context_with(driver: Arc<FakeDriver>, config: SuiteConfig) -> PageContext {
    PageContext::new(driver, Arc::new(config))
}

/// Rendered error locator for every field of `sections`
pub fn field_error_keys(sections: &[PassengerSection]) -> Vec<String> {
    let page = PassengerDetailsPage::new(context(FakeDriver::new()));
    sections
        .iter()
        .flat_map(|section| section.field_ids())
        .map(|field| page.error_messages_for_field(field).to_string())
        .collect()
}

/// Validation errors for `sections` that show up on the `on_click`-th continue click
pub fn errors_on_continue(
    driver: &FakeDriver,
    sections: &[PassengerSection],
    on_click: u32,
    delay: Duration,
) {
    let mut effects = vec![Effect::Insert {
        key: ANY_ERROR.to_string(),
        node: FakeNode::visible().text("Required"),
        delay,
    }];
    effects.extend(field_error_keys(sections).into_iter().map(|key| Effect::Insert {
        key,
        node: FakeNode::visible().text("This field is required"),
        delay,
    }));
    driver.on_click(PAX_CONTINUE, on_click, effects);
}

/// Passenger form with empty inputs for the given optional sections
pub fn passenger_form(driver: &FakeDriver, children: bool, infants: bool) {
    driver.insert("#pax-form", FakeNode::visible());
    driver.insert(PAX_CONTINUE, FakeNode::visible());
    if children {
        driver.insert("[id^=\"FIRSTNAMECHILD\"]", FakeNode::visible());
    }
    if infants {
        driver.insert("[id^=\"FIRSTNAMEINFANT\"]", FakeNode::visible());
    }
}

pub const DESTINATIONS: [&str; 4] = ["Turkije", "Griekenland", "Spanje", "Egypte"];
pub const DATES: [&str; 3] = ["vrijdag 12 juni 2026", "zaterdag 13 juni 2026", "maandag 15 juni 2026"];
pub const HOTEL: &str = "Hotel Sol Costa";

pub const DESTINATION_LINKS: &str = ".dropModalScope_destinations >> .DestinationsList__link:not(.DestinationsList__disabled)";
pub const AVAILABLE_DATES: &str = ".dropModalScope_Departuredate >> .SelectLegacyDate__available";
pub const CHILD_AGE_SELECT: &str = ".ChildrenAge__childAgeSelector select";
pub const SEARCH_BUTTON: &str = "[data-test-id=\"search-button\"]";
pub const RESULTS_LIST: &str = "[data-test-id=\"search-results-list\"]";
pub const RESULT_ITEMS: &str =
    "[data-test-id=\"search-results-list\"] >> [data-test-id=\"result-item\"]";
pub const FIRST_RESULT: &str =
    "[data-test-id=\"search-results-list\"] >> [data-test-id=\"result-item\"] >> nth=0";
pub const HOTEL_NAME: &str = "[data-test-id=\"search-results-list\"] >> [data-test-id=\"result-item\"] >> nth=0 >> [data-test-id=\"hotel-name\"]";
pub const RESULT_CONTINUE: &str = "[data-test-id=\"search-results-list\"] >> [data-test-id=\"result-item\"] >> nth=0 >> div.ResultsListItem__continue button[data-test-id=\"continue-button\"]:visible";
pub const HOTEL_OVERVIEW: &str = "#headerContainer__component";
pub const HOTEL_CONTINUE: &str = ".ProgressbarNavigation__summaryButton";
pub const FLIGHTS_CONTINUE: &str =
    ".ProgressbarNavigation__container .ProgressbarNavigation__summaryButton:visible";

const AGE_VALUES: [&str; 19] = [
    "-1", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15",
    "16", "17",
];

/// Search results that render `delay` after the `on_click`-th search
pub fn results_on_search(driver: &FakeDriver, on_click: u32, delay: Duration) {
    let nodes = [
        (RESULTS_LIST, FakeNode::visible()),
        (RESULT_ITEMS, FakeNode::list(&[HOTEL, "Hotel Aqua Mar"])),
        (HOTEL_NAME, FakeNode::visible().text(HOTEL)),
        (RESULT_CONTINUE, FakeNode::visible()),
    ];
    for (key, _) in &nodes {
        driver.remove(key);
    }
    driver.on_click(
        SEARCH_BUTTON,
        on_click,
        nodes
            .into_iter()
            .map(|(key, node)| Effect::Insert {
                key: key.to_string(),
                node,
                delay,
            })
            .collect(),
    );
}

/// The whole funnel from the landing page to an empty passenger form
pub fn booking_site(driver: &FakeDriver, children: u32) {
    driver.insert("[data-test-id=\"airport-input\"]", FakeNode::visible());
    driver.insert(
        ".dropModalScope_airports >> .SelectAirports__parentGroup .inputs__CheckboxTextAligned",
        FakeNode::list(&["Nederland", "België", "Duitsland"]),
    );
    for scope in [
        ".dropModalScope_airports",
        ".dropModalScope_destinations",
        ".dropModalScope_Departuredate",
        ".dropModalScope_roomandguest",
    ] {
        driver.insert(
            &format!("{} >> .DropModal__footerContainer .DropModal__apply", scope),
            FakeNode::visible(),
        );
    }

    driver.insert(
        ".Package__destinations .inputs__children:visible",
        FakeNode::visible(),
    );
    driver.insert(DESTINATION_LINKS, FakeNode::list(&DESTINATIONS));
    driver.insert(
        ".dropModalScope_destinations >> .DestinationsList__droplistContainer .DestinationsList__parentCheckbox:visible",
        FakeNode::visible(),
    );

    driver.insert("[data-test-id=\"departure-date-input\"]", FakeNode::visible());
    driver.insert(
        AVAILABLE_DATES,
        FakeNode::list(&["12", "13", "15"]).attribute("aria-label", &DATES),
    );

    driver.insert("[data-test-id=\"rooms-and-guest-input\"]", FakeNode::visible());
    driver.insert(".AdultSelector__adultSelector select", FakeNode::visible());
    driver.insert(".ChildrenSelector__childrenSelector select", FakeNode::visible());
    if children > 0 {
        driver.insert(
            CHILD_AGE_SELECT,
            FakeNode {
                count: children as usize,
                visible: true,
                ..Default::default()
            },
        );
        for child in 0..children {
            driver.insert(
                &format!("{} >> nth={} >> option:not([disabled])", CHILD_AGE_SELECT, child),
                FakeNode::visible().attribute("value", &AGE_VALUES),
            );
        }
    }
    driver.insert(SEARCH_BUTTON, FakeNode::visible());

    driver.insert(RESULTS_LIST, FakeNode::visible());
    driver.insert(RESULT_ITEMS, FakeNode::list(&[HOTEL, "Hotel Aqua Mar", "Hotel Zafiro"]));
    driver.insert(HOTEL_NAME, FakeNode::visible().text(&format!("  {}  ", HOTEL)));
    driver.insert(RESULT_CONTINUE, FakeNode::visible());

    driver.insert(HOTEL_OVERVIEW, FakeNode::visible());
    driver.insert(HOTEL_CONTINUE, FakeNode::visible());
    driver.insert(".ContainerWithRiteSideHolidaySummary", FakeNode::visible());
    driver.insert(FLIGHTS_CONTINUE, FakeNode::visible());

    passenger_form(driver, children > 0, false);
    let mut sections = vec![PassengerSection::AdultMainBooker];
    if children > 0 {
        sections.push(PassengerSection::ChildPassenger);
    }
    errors_on_continue(driver, &sections, 1, Duration::ZERO);
}
