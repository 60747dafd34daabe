//! Backend-independent page access
//!
//! Page objects build [`Locator`]s and talk to a [`PageDriver`]. The
//! Playwright bridge is the production driver; tests use an in-memory one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::E2eResult;
use crate::interaction::{Interactable, DEFAULT_ACTION_TIMEOUT};

/// One step of a selector chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Css { selector: String },
    /// ARIA role with a case-insensitive accessible-name pattern
    Role { role: String, name_pattern: String },
    Nth { index: usize },
    Last,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Css { selector } => f.write_str(selector),
            Segment::Role { role, name_pattern } => {
                write!(f, "role={}[name=/{}/i]", role, name_pattern)
            }
            Segment::Nth { index } => write!(f, "nth={}", index),
            Segment::Last => f.write_str("nth=-1"),
        }
    }
}

/// Lazily-resolved selector chain, evaluated against the live page on every use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Css {
                selector: selector.into(),
            }],
        }
    }

    pub fn role(role: impl Into<String>, name_pattern: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Role {
                role: role.into(),
                name_pattern: name_pattern.into(),
            }],
        }
    }

    /// Narrow to descendants matching `selector`
    pub fn locator(&self, selector: impl Into<String>) -> Self {
        self.with(Segment::Css {
            selector: selector.into(),
        })
    }

    pub fn nth(&self, index: usize) -> Self {
        self.with(Segment::Nth { index })
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn last(&self) -> Self {
        self.with(Segment::Last)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Element state to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// Operations the journey needs from a live page
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> E2eResult<()>;

    async fn url(&self) -> E2eResult<String>;

    async fn title(&self) -> E2eResult<String>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    /// `Ok(false)` when the state was not reached in time
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration)
        -> E2eResult<bool>;

    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> E2eResult<()>;

    async fn click(&self, locator: &Locator, timeout: Duration) -> E2eResult<()>;

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    async fn select_option(&self, locator: &Locator, value: &str, timeout: Duration)
        -> E2eResult<()>;
}

/// A locator bound to a driver
#[derive(Clone)]
pub struct Element {
    driver: Arc<dyn PageDriver>,
    locator: Locator,
    click_timeout: Duration,
}

impl Element {
    pub fn new(driver: Arc<dyn PageDriver>, locator: Locator) -> Self {
        Self {
            driver,
            locator,
            click_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    pub fn with_click_timeout(mut self, timeout: Duration) -> Self {
        self.click_timeout = timeout;
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

#[async_trait]
impl Interactable for Element {
    fn describe(&self) -> String {
        self.locator.to_string()
    }

    async fn count(&self) -> E2eResult<usize> {
        self.driver.count(&self.locator).await
    }

    async fn is_visible(&self) -> E2eResult<bool> {
        self.driver.is_visible(&self.locator).await
    }

    async fn wait_visible(&self, timeout: Duration) -> E2eResult<bool> {
        self.driver
            .wait_for(&self.locator, WaitState::Visible, timeout)
            .await
    }

    async fn scroll_into_view(&self, timeout: Duration) -> E2eResult<()> {
        self.driver.scroll_into_view(&self.locator, timeout).await
    }

    async fn click(&self) -> E2eResult<()> {
        self.driver.click(&self.locator, self.click_timeout).await
    }
}
