//! Acting on elements that may be duplicated, hidden or still animating
//!
//! Pages in the funnel keep hidden clones of buttons in the DOM and render
//! panels asynchronously. [`act_on`] turns a query into exactly one visible
//! target before clicking it.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::poll::Poller;

/// Default budget for a target to become visible
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the best-effort scroll before acting
pub const DEFAULT_SCROLL_TIMEOUT: Duration = Duration::from_secs(2);

/// Something on the page that can be counted, seen and clicked
#[async_trait]
pub trait Interactable: Send + Sync {
    /// Human-readable identity for logs and errors
    fn describe(&self) -> String;

    /// Number of nodes currently matching
    async fn count(&self) -> E2eResult<usize>;

    /// Whether the target is visible right now
    async fn is_visible(&self) -> E2eResult<bool>;

    /// Wait until the target is visible. `Ok(false)` means the budget ran out;
    /// a failing visibility query ends the wait with that error.
    async fn wait_visible(&self, timeout: Duration) -> E2eResult<bool> {
        let failure: Mutex<Option<E2eError>> = Mutex::new(None);
        let slot = &failure;
        let outcome = Poller::new(timeout)
            .run(move || async move {
                match self.is_visible().await {
                    Ok(visible) => visible,
                    Err(e) => {
                        *slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(e);
                        true
                    }
                }
            })
            .await;

        match failure.into_inner().unwrap_or_else(|p| p.into_inner()) {
            Some(e) => Err(e),
            None => Ok(outcome.is_found()),
        }
    }

    async fn scroll_into_view(&self, timeout: Duration) -> E2eResult<()>;

    async fn click(&self) -> E2eResult<()>;
}

/// Outcome of a step whose failure must never fail the scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Done,
    Skipped,
    FailedIgnored(String),
}

impl BestEffort {
    /// The step ran, whether or not it succeeded
    pub fn attempted(&self) -> bool {
        !matches!(self, BestEffort::Skipped)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActOptions {
    pub timeout: Duration,
    pub scroll_timeout: Duration,
    pub scroll_first: bool,
}

impl Default for ActOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ACTION_TIMEOUT,
            scroll_timeout: DEFAULT_SCROLL_TIMEOUT,
            scroll_first: true,
        }
    }
}

impl ActOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// What happened on the way to a successful click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActReport {
    pub scroll: BestEffort,
    pub waited: Duration,
}

/// Scroll (best effort), wait for visibility, then click once.
///
/// A target that never becomes visible fails with
/// [`E2eError::VisibilityTimeout`] and is not clicked. A failed click is
/// [`E2eError::ActionFailed`] and is not retried here.
pub async fn act_on<T>(target: &T, options: &ActOptions) -> E2eResult<ActReport>
where
    T: Interactable + ?Sized,
{
    let description = target.describe();

    let scroll = if options.scroll_first {
        match target.scroll_into_view(options.scroll_timeout).await {
            Ok(()) => BestEffort::Done,
            Err(e) => {
                debug!(
                    "[act_on] scroll into view failed for {} (element may already be visible): {}",
                    description, e
                );
                BestEffort::FailedIgnored(e.to_string())
            }
        }
    } else {
        BestEffort::Skipped
    };

    let start = Instant::now();
    if !target.wait_visible(options.timeout).await? {
        return Err(E2eError::VisibilityTimeout {
            target: description,
            timeout: options.timeout,
        });
    }
    let waited = start.elapsed();

    target.click().await.map_err(|e| match e {
        E2eError::ActionFailed { .. } => e,
        other => E2eError::ActionFailed {
            target: description.clone(),
            reason: other.to_string(),
        },
    })?;

    debug!("Clicked {} after {:?}", description, waited);
    Ok(ActReport { scroll, waited })
}
