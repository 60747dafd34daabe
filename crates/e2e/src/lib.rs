//! Tripcheck E2E Journey Framework
//!
//! This crate drives the holiday booking funnel end to end:
//! - Controls a browser through a persistent Playwright bridge process
//! - Makes every random selection from a per-worker seeded generator
//! - Clicks through a scroll / wait-visible / click protocol
//! - Confirms passenger form validation by polling with bounded re-triggers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Journey Runner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  JourneyRunner                                              │
//! │    ├── run_all(scenarios) -> TestSuiteResult                │
//! │    │     └── one worker per PlaywrightSession (JoinSet)     │
//! │    ├── run_scenario(driver, scenario, worker, seed)         │
//! │    │     └── SeededRandom(base + worker)                    │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page objects (pages::*)                                    │
//! │    ├── HomePage / ResultsPage / HotelDetailsPage            │
//! │    ├── FlightsPage                                          │
//! │    └── PassengerDetailsPage ── Escalation (poll)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  act_on (interaction) ── Interactable ── Element            │
//! │  PageDriver ── PlaywrightSession | in-memory fakes          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod error;
pub mod interaction;
pub mod pages;
pub mod playwright;
pub mod poll;
pub mod runner;

pub use browser::{Element, Locator, PageDriver, WaitState};
pub use error::{E2eError, E2eResult};
pub use interaction::{act_on, ActOptions, ActReport, BestEffort, Interactable};
pub use poll::{poll_until_true, Escalation, PollOutcome, Poller};
pub use runner::{assign_workers, JourneyRunner, RunnerConfig, TestResult, TestSuiteResult};
