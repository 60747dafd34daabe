//! Journey runner: seeds each worker, drives the funnel step by step and
//! collects results

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tripcheck_common::{effective_seed, BookingScenario, BookingSelection, SeededRandom, SuiteConfig};

use crate::browser::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::pages::{
    FlightsPage, HomePage, HotelDetailsPage, PageContext, PassengerDetailsPage, ResultsPage,
    ValidationReport,
};
use crate::playwright::{PlaywrightConfig, PlaywrightSession};

/// Result of executing a journey step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    /// Effective seed; rerun with `SEED=<seed>` and one worker to replay
    pub seed: u32,
    pub worker_index: u32,
    /// Runs it took, retries included; every run reuses the same seed
    pub attempts: u32,
    pub selection: Option<BookingSelection>,
    pub validation: Option<ValidationReport>,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub base_seed: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    /// Order results by worker then name and count outcomes
    pub fn from_results(
        mut results: Vec<TestResult>,
        base_seed: i64,
        started_at: chrono::DateTime<chrono::Utc>,
        duration_ms: u64,
    ) -> Self {
        results.sort_by(|a, b| {
            a.worker_index
                .cmp(&b.worker_index)
                .then_with(|| a.name.cmp(&b.name))
        });
        let passed = results.iter().filter(|r| r.success).count();

        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            skipped: 0,
            duration_ms,
            base_seed,
            started_at,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Deal scenarios round-robin over `workers`; workers left without a
/// scenario are omitted
pub fn assign_workers(
    scenarios: Vec<BookingScenario>,
    workers: u32,
) -> Vec<(u32, Vec<BookingScenario>)> {
    let workers = workers.max(1) as usize;
    let mut batches: Vec<Vec<BookingScenario>> = vec![Vec::new(); workers];
    for (i, scenario) in scenarios.into_iter().enumerate() {
        batches[i % workers].push(scenario);
    }

    batches
        .into_iter()
        .enumerate()
        .filter(|(_, batch)| !batch.is_empty())
        .map(|(worker_index, batch)| (worker_index as u32, batch))
        .collect()
}

/// Configuration for the journey runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub suite: SuiteConfig,
    pub playwright: PlaywrightConfig,
    pub workers: u32,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            suite: SuiteConfig::default(),
            playwright: PlaywrightConfig::default(),
            workers: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Records named steps in order and stops at the first failure
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Vec<StepResult>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn step<T, F>(&mut self, name: &str, fut: F) -> E2eResult<T>
    where
        F: Future<Output = E2eResult<T>>,
    {
        debug!("Executing step: {}", name);
        let start = Instant::now();
        let result = fut.await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!("✓ {} ({} ms)", name, duration_ms),
            Err(e) => error!("✗ {} - {}", name, e),
        }

        self.steps.push(StepResult {
            success: result.is_ok(),
            step_name: name.to_string(),
            duration_ms,
            error: result.as_ref().err().map(|e| e.to_string()),
        });

        result.map_err(|e| E2eError::StepFailed {
            step: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<StepResult> {
        self.steps
    }
}

/// Outcome of the booking journey proper
#[derive(Debug, Clone)]
pub struct JourneyOutcome {
    pub selection: BookingSelection,
    pub validation: ValidationReport,
}

/// Walk the whole funnel for one scenario.
///
/// Selections are recorded into `selection` as they are made so a failure
/// late in the funnel still reports what was chosen.
pub async fn run_booking_journey(
    ctx: &PageContext,
    scenario: &BookingScenario,
    rng: &mut SeededRandom,
    recorder: &mut StepRecorder,
    selection: &mut BookingSelection,
) -> E2eResult<ValidationReport> {
    let home = HomePage::new(ctx.clone());
    let results = ResultsPage::new(ctx.clone());
    let hotel = HotelDetailsPage::new(ctx.clone());
    let flights = FlightsPage::new(ctx.clone());
    let pax = PassengerDetailsPage::new(ctx.clone());

    selection.adults = scenario.adults;
    selection.children = scenario.children;

    recorder
        .step("1-2. Open homepage + accept cookies", home.open())
        .await?;

    selection.departure_airport = recorder
        .step(
            "3. Select available departure airport",
            home.select_departure_airport(),
        )
        .await?;

    selection.destination = recorder
        .step(
            "4. Select random destination",
            home.select_random_destination(rng),
        )
        .await?;

    selection.departure_date = recorder
        .step(
            "5. Select an available departure date",
            home.select_available_departure_date(rng),
        )
        .await?;

    let guests_step = format!(
        "6. Rooms & Guests: {} adults + {} child(ren) with random age",
        scenario.adults, scenario.children
    );
    selection.child_ages = recorder
        .step(&guests_step, home.set_rooms_and_guests(scenario, rng))
        .await?;

    recorder
        .step("7. Search for holidays", home.search_holidays())
        .await?;

    selection.hotel_name = Some(
        recorder
            .step(
                "8. Pick first available hotel from results",
                results.open_first_available_hotel(),
            )
            .await?,
    );

    recorder
        .step("9. Hotel details: click Continue", async {
            hotel.wait_until_loaded().await?;
            hotel.continue_from_hotel_details().await
        })
        .await?;

    recorder
        .step(
            "10-11. Select available flights and continue to passenger details",
            async {
                flights.wait_until_loaded().await?;
                flights.select_available_flights_and_continue().await
            },
        )
        .await?;

    recorder
        .step(
            "12. Validate error messages in passenger fields",
            pax.validate_passenger_field_errors(),
        )
        .await
}

/// Main journey runner
#[derive(Clone)]
pub struct JourneyRunner {
    config: Arc<RunnerConfig>,
}

impl JourneyRunner {
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one scenario against an already-open page
    pub async fn run_scenario(
        &self,
        driver: Arc<dyn PageDriver>,
        scenario: &BookingScenario,
        worker_index: u32,
        base_seed: i64,
    ) -> TestResult {
        let seed = effective_seed(base_seed, worker_index);
        let mut rng = SeededRandom::new(seed);
        info!(
            "Running '{}' on worker {} with seed {}",
            scenario.name, worker_index, seed
        );

        let ctx = PageContext::new(driver, Arc::new(self.config.suite.clone()));
        let mut recorder = StepRecorder::new();
        let mut selection = BookingSelection::default();
        let start = Instant::now();

        let budget = self.config.suite.timeouts.journey();
        let outcome = tokio::time::timeout(
            budget,
            run_booking_journey(&ctx, scenario, &mut rng, &mut recorder, &mut selection),
        )
        .await
        .unwrap_or_else(|_| {
            Err(E2eError::Timeout(format!(
                "journey '{}' exceeded {:?}",
                scenario.name, budget
            )))
        });

        let (validation, error) = match outcome {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e.to_string())),
        };

        TestResult {
            name: scenario.name.clone(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            seed,
            worker_index,
            attempts: 1,
            selection: Some(selection),
            validation,
            steps: recorder.into_steps(),
            error,
        }
    }

    /// Run one scenario, re-running it with the same seed while it fails and
    /// retries remain
    pub async fn run_scenario_with_retries(
        &self,
        driver: Arc<dyn PageDriver>,
        scenario: &BookingScenario,
        worker_index: u32,
        base_seed: i64,
    ) -> TestResult {
        let retries = self.config.suite.scenario_retries();
        let mut attempt = 1;

        loop {
            let mut result = self
                .run_scenario(driver.clone(), scenario, worker_index, base_seed)
                .await;
            result.attempts = attempt;

            if result.success || attempt > retries {
                return result;
            }

            warn!(
                "'{}' failed on attempt {}/{}: {}; retrying",
                scenario.name,
                attempt,
                retries + 1,
                result.error.as_deref().unwrap_or("unknown error")
            );
            tokio::time::sleep(self.config.suite.retry_delay()).await;
            attempt += 1;
        }
    }

    /// Run scenarios across the configured number of workers
    pub async fn run_all(&self, scenarios: Vec<BookingScenario>) -> E2eResult<TestSuiteResult> {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let base_seed = self.config.suite.run.base_seed();
        let workers = self.config.workers.max(1);

        info!(
            "Running {} scenario(s) on {} worker(s), base seed {}",
            scenarios.len(),
            workers,
            base_seed
        );

        let total = scenarios.len();
        let mut set = JoinSet::new();
        for (worker_index, batch) in assign_workers(scenarios, workers) {
            let runner = self.clone();
            set.spawn(async move { runner.run_worker(worker_index, base_seed, batch).await });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(worker_results) => results.extend(worker_results),
                Err(e) => return Err(E2eError::Bridge(format!("worker task failed: {}", e))),
            }
        }

        let suite = TestSuiteResult::from_results(
            results,
            base_seed,
            started_at,
            start.elapsed().as_millis() as u64,
        );
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );
        Ok(suite)
    }

    async fn run_worker(
        &self,
        worker_index: u32,
        base_seed: i64,
        scenarios: Vec<BookingScenario>,
    ) -> Vec<TestResult> {
        let session = match PlaywrightSession::launch(self.config.playwright.clone()).await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                error!("Worker {} could not start a browser: {}", worker_index, e);
                return scenarios
                    .iter()
                    .map(|scenario| TestResult {
                        name: scenario.name.clone(),
                        success: false,
                        duration_ms: 0,
                        seed: effective_seed(base_seed, worker_index),
                        worker_index,
                        attempts: 0,
                        selection: None,
                        validation: None,
                        steps: vec![],
                        error: Some(e.to_string()),
                    })
                    .collect();
            }
        };

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            let driver: Arc<dyn PageDriver> = session.clone();
            results.push(
                self.run_scenario_with_retries(driver, scenario, worker_index, base_seed)
                    .await,
            );
        }

        if let Err(e) = session.close().await {
            warn!("Worker {} failed to close its browser: {}", worker_index, e);
        }
        results
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.output_dir, results)
    }
}

pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
