//! Error types for E2E runs

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{target} not visible within {timeout:?}")]
    VisibilityTimeout { target: String, timeout: Duration },

    #[error("Action on {target} failed: {reason}")]
    ActionFailed { target: String, reason: String },

    #[error("Feedback for {target} failed to trigger after {attempts} attempt(s) in {elapsed:?}")]
    FeedbackNotTriggered {
        target: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("No visible validation errors for {section}/{field} after {attempts} attempt(s) in {elapsed:?}")]
    ValidationMissing {
        section: String,
        field: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error(transparent)]
    Common(#[from] tripcheck_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
