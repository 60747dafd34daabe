//! Suite configuration
//!
//! Defaults are layered as: built-in values, then an optional TOML file, then
//! environment variables. Environment lookups go through a closure so tests
//! can supply their own variables without touching the process environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

/// Target environment of the booking site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Parse `TEST_ENV`; unknown values fall back to dev
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            None => Environment::Dev,
            Some("dev") => Environment::Dev,
            Some("staging") => Environment::Staging,
            Some("production") => Environment::Production,
            Some(other) => {
                warn!("Invalid TEST_ENV: {}. Defaulting to 'dev'", other);
                Environment::Dev
            }
        }
    }

    /// Built-in settings for this environment
    pub fn settings(&self) -> EnvironmentConfig {
        let base_url = match self {
            Environment::Dev => "https://www.tui.nl/h/nl",
            Environment::Staging => "https://staging.tui.nl/h/nl",
            Environment::Production => "https://www.tui.nl/h/nl",
        };

        EnvironmentConfig {
            name: *self,
            base_url: base_url.to_string(),
        }
    }
}

/// Per-environment URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: Environment,
    pub base_url: String,
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Whole journey budget
    pub journey_ms: u64,

    /// Clicks, selects and other single actions
    pub action_ms: u64,

    /// Content expected shortly after its container rendered
    pub expect_ms: u64,

    /// Page navigation
    pub navigation_ms: u64,

    /// Funnel pages that render after a server round trip
    pub page_load_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            journey_ms: 240_000,
            action_ms: 5_000,
            expect_ms: 15_000,
            navigation_ms: 10_000,
            page_load_ms: 40_000,
        }
    }
}

impl Timeouts {
    pub fn journey(&self) -> Duration {
        Duration::from_millis(self.journey_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }
}

/// Scenario-level retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Re-runs of a failed scenario; unset means 2 on CI and none elsewhere
    pub retries: Option<u32>,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: None,
            delay_ms: 250,
        }
    }
}

/// Cookie consent controls, tried in order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Case-insensitive accessible-name patterns of consent buttons
    pub consent_button_patterns: Vec<String>,

    /// CSS fallback for banners without an accessible button name
    pub cookie_accept_button: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            consent_button_patterns: vec![
                "accepteer cookies|accept cookies".to_string(),
                "akkoord|toestaan|accept all".to_string(),
            ],
            cookie_accept_button: ".CookieBanner__accept".to_string(),
        }
    }
}

/// Defaults applied when a scenario leaves a value out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestDataDefaults {
    pub child_age_range: AgeRange,
}

impl Default for TestDataDefaults {
    fn default() -> Self {
        Self {
            child_age_range: AgeRange { min: 0, max: 17 },
        }
    }
}

/// Inclusive age range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && age <= self.max
    }
}

/// Run-level switches, mostly taken from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunEnv {
    /// Base seed; wall-clock milliseconds when absent
    pub seed: Option<i64>,
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub ci: bool,
}

impl Default for RunEnv {
    fn default() -> Self {
        Self {
            seed: None,
            headless: true,
            slow_mo_ms: 0,
            ci: false,
        }
    }
}

impl RunEnv {
    /// Seed shared by all workers of this run
    pub fn base_seed(&self) -> i64 {
        self.seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
    }
}

/// Complete suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub environment: Environment,
    pub base_url: String,
    pub timeouts: Timeouts,
    pub retry: RetryConfig,
    pub selectors: SelectorConfig,
    pub test_data: TestDataDefaults,
    pub run: RunEnv,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Dev)
    }
}

impl SuiteConfig {
    /// Built-in configuration for an environment
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            base_url: environment.settings().base_url,
            timeouts: Timeouts::default(),
            retry: RetryConfig::default(),
            selectors: SelectorConfig::default(),
            test_data: TestDataDefaults::default(),
            run: RunEnv::default(),
        }
    }

    /// Load from an optional TOML file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit variable lookup
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse_or_default(lookup("TEST_ENV").as_deref());

        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let mut from_file: SuiteConfig = toml::from_str(&raw)?;
                // The environment variable wins over the file's environment
                if lookup("TEST_ENV").is_some() && from_file.environment != environment {
                    from_file.environment = environment;
                    from_file.base_url = environment.settings().base_url;
                }
                from_file
            }
            None => Self::for_environment(environment),
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no journey could run with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        let timeouts = [
            ("journey_ms", self.timeouts.journey_ms),
            ("action_ms", self.timeouts.action_ms),
            ("expect_ms", self.timeouts.expect_ms),
            ("navigation_ms", self.timeouts.navigation_ms),
            ("page_load_ms", self.timeouts.page_load_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::InvalidConfig(format!("timeouts.{} must be > 0", name)));
        }

        let ages = self.test_data.child_age_range;
        if ages.min > ages.max {
            return Err(Error::InvalidConfig(format!(
                "child_age_range {}-{} is empty",
                ages.min, ages.max
            )));
        }
        Ok(())
    }

    /// How many times a failed scenario is run again
    pub fn scenario_retries(&self) -> u32 {
        self.retry
            .retries
            .unwrap_or(if self.run.ci { 2 } else { 0 })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            info!("Overriding baseUrl with BASE_URL env var: {}", url);
            self.base_url = url;
        }

        let number = |key: &str, current: u64| -> u64 {
            match lookup(key) {
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    warn!("Ignoring non-numeric {}={}", key, raw);
                    current
                }),
                None => current,
            }
        };
        let flag = |key: &str, current: bool| -> bool {
            lookup(key).map(|raw| parse_flag(&raw)).unwrap_or(current)
        };

        self.timeouts.journey_ms = number("TEST_TIMEOUT", self.timeouts.journey_ms);
        self.timeouts.expect_ms = number("EXPECT_TIMEOUT", self.timeouts.expect_ms);
        if let Some(raw) = lookup("RETRY_COUNT") {
            match raw.trim().parse::<u32>() {
                Ok(retries) => self.retry.retries = Some(retries),
                Err(_) => warn!("Ignoring non-numeric RETRY_COUNT={}", raw),
            }
        }

        if let Some(raw) = lookup("SEED") {
            match raw.trim().parse::<i64>() {
                Ok(seed) => self.run.seed = Some(seed),
                Err(_) => warn!("Ignoring non-numeric SEED={}; falling back to clock", raw),
            }
        }
        self.run.headless = flag("HEADLESS", self.run.headless);
        self.run.slow_mo_ms = number("SLOW_MO", self.run.slow_mo_ms);
        self.run.ci = flag("CI", self.run.ci);
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "true" | "1")
}

/// Seed for one worker: `base + worker_index`, truncated to 32 bits
pub fn effective_seed(base: i64, worker_index: u32) -> u32 {
    base.wrapping_add(worker_index as i64) as u32
}
