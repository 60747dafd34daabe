//! Bounded polling for asynchronous page reactions
//!
//! A check moves `Unresolved -> Searching -> {Found, Exhausted}`. `Searching`
//! re-enters itself once per tick until the predicate holds or the budget is
//! spent. Every tick yields to the runtime; nothing here waits unbounded.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace};

use crate::error::{E2eError, E2eResult};

/// Delay between two evaluations of a predicate
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal state of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Found { attempts: u32, elapsed: Duration },
    Exhausted { attempts: u32, elapsed: Duration },
}

impl PollOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PollOutcome::Found { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Found { attempts, .. } | PollOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Found { elapsed, .. } | PollOutcome::Exhausted { elapsed, .. } => *elapsed,
        }
    }
}

/// Re-evaluates a predicate until it holds or a deadline passes
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
}

impl Poller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the predicate to a terminal state.
    ///
    /// The predicate is evaluated at least once, and once more at the
    /// deadline. A single evaluation that outlives the remaining budget counts
    /// as `false`.
    pub async fn run<F, Fut>(&self, mut predicate: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let remaining = self.timeout.saturating_sub(start.elapsed());
            let budget = remaining.max(self.interval);

            let hit = timeout(budget, predicate()).await.unwrap_or(false);
            let elapsed = start.elapsed();

            if hit {
                trace!("Poll found after {} attempt(s) in {:?}", attempts, elapsed);
                return PollOutcome::Found { attempts, elapsed };
            }
            if elapsed >= self.timeout {
                trace!("Poll exhausted after {} attempt(s) in {:?}", attempts, elapsed);
                return PollOutcome::Exhausted { attempts, elapsed };
            }

            sleep(self.interval.min(self.timeout - elapsed)).await;
        }
    }
}

/// Poll `predicate` for up to `timeout`; never fails, only reports
pub async fn poll_until_true<F, Fut>(timeout: Duration, predicate: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    Poller::new(timeout).run(predicate).await.is_found()
}

/// Successful confirmation of expected feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Bounded re-trigger policy for feedback that may lag behind its cause.
///
/// Attempt 1 polls for feedback of an action the caller already performed.
/// Every later attempt re-issues the action first. The re-trigger must be
/// safe to repeat against the target; client-side form validation is.
#[derive(Debug, Clone, Copy)]
pub struct Escalation {
    max_attempts: u32,
    poller: Poller,
}

impl Escalation {
    /// `max_attempts` counts the initial poll, so `6` allows five re-triggers
    pub fn new(max_attempts: u32, poll_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            poller: Poller::new(poll_timeout),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_interval(interval);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Confirm that `predicate` becomes true, re-triggering between polls.
    ///
    /// Errors from `retrigger` are returned as-is. Exhausting every attempt
    /// yields [`E2eError::FeedbackNotTriggered`].
    pub async fn confirm<P, PF, R, RF>(
        &self,
        target: &str,
        mut predicate: P,
        mut retrigger: R,
    ) -> E2eResult<Confirmation>
    where
        P: FnMut() -> PF,
        PF: Future<Output = bool>,
        R: FnMut() -> RF,
        RF: Future<Output = E2eResult<()>>,
    {
        let start = Instant::now();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                debug!(
                    "Feedback for {} not seen; re-triggering (attempt {}/{})",
                    target, attempt, self.max_attempts
                );
                retrigger().await?;
            }

            if self.poller.run(&mut predicate).await.is_found() {
                return Ok(Confirmation {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
        }

        Err(E2eError::FeedbackNotTriggered {
            target: target.to_string(),
            attempts: self.max_attempts,
            elapsed: start.elapsed(),
        })
    }
}
