//! Background scheduler for recurring event expansion.
//!
//! Runs an expansion job immediately, then once per interval (a day by
//! default) with:
//! - Jitter so that several deployments do not expand at the same instant
//! - Exponential backoff after failed runs
//! - A cap on consecutive failures after which the scheduler gives up

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::ServerResult;
use crate::materializer::ExpansionReport;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between runs.
    pub run_interval: Duration,
    /// Maximum jitter to add to the interval (as fraction 0.0-1.0).
    pub jitter_fraction: f64,
    /// Initial backoff duration on error.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Consecutive failures after which the scheduler stops.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_interval: DAY,
            jitter_fraction: 0.02,                   // about half an hour
            initial_backoff: Duration::from_secs(60),
            max_backoff: Duration::from_secs(3600),
            backoff_multiplier: 2.0,
            max_consecutive_failures: 10,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given run interval.
    pub fn new(run_interval: Duration) -> Self {
        Self {
            run_interval,
            ..Default::default()
        }
    }

    /// Creates a config running every `hours` hours.
    pub fn every_hours(hours: u64) -> Self {
        Self::new(Duration::from_secs(hours * 60 * 60))
    }

    /// Builder: set jitter fraction.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Builder: set the failure cap.
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Calculates the next run delay with jitter.
    pub fn next_run_delay(&self) -> Duration {
        let base = self.run_interval.as_secs_f64();
        let jitter = rand_jitter(base * self.jitter_fraction);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }

    /// Calculates backoff delay based on consecutive failures.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures as i32 - 1);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Pseudo-random value in [-range, range] derived from the clock.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let fraction = (nanos as f64) / 1_000_000_000.0;
    (fraction * 2.0 - 1.0) * range
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run an expansion now, even while paused.
    RunNow,
    /// Skip scheduled runs until resumed.
    Pause,
    Resume,
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub paused: bool,
    /// Set once the failure cap is reached.
    pub gave_up: bool,
    pub consecutive_failures: u32,
    /// Number of completed runs, successful or not.
    pub runs: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Report of the last successful run.
    pub last_report: Option<ExpansionReport>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful run.
    pub fn record_success(&mut self, report: ExpansionReport) {
        self.runs += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
        self.last_attempt = self.last_success;
        self.last_error = None;
        self.last_report = Some(report);
    }

    /// Records a failed run.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.runs += 1;
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// Periodically runs the expansion job.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop until stopped or until it gives up.
    pub async fn run<F, Fut>(self, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServerResult<ExpansionReport>> + Send,
    {
        // The sender stays alive so the loop only ends on an explicit Stop.
        let Self {
            config,
            state,
            command_tx: _command_tx,
            command_rx: mut commands,
        } = self;
        let runner = Runner { config, state };

        info!(
            interval_secs = runner.config.run_interval.as_secs(),
            "Scheduler started"
        );

        runner.run_job(&job).await;

        loop {
            if runner.state.read().await.gave_up {
                break;
            }

            let delay = runner.calculate_next_delay().await;
            debug!(delay_secs = delay.as_secs(), "Scheduling next expansion");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if runner.state.read().await.paused {
                        debug!("Scheduler paused, skipping expansion");
                        continue;
                    }
                    runner.run_job(&job).await;
                }
                cmd = commands.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RunNow) => {
                            debug!("Received RunNow command");
                            runner.run_job(&job).await;
                        }
                        Some(SchedulerCommand::Pause) => {
                            info!("Scheduler paused");
                            runner.state.write().await.paused = true;
                        }
                        Some(SchedulerCommand::Resume) => {
                            info!("Scheduler resumed");
                            runner.state.write().await.paused = false;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// The parts of a scheduler used while its loop runs.
struct Runner {
    config: SchedulerConfig,
    state: SharedSchedulerState,
}

impl Runner {
    async fn calculate_next_delay(&self) -> Duration {
        let state = self.state.read().await;
        if state.consecutive_failures > 0 {
            let backoff = self.config.backoff_delay(state.consecutive_failures);
            debug!(
                failures = state.consecutive_failures,
                backoff_secs = backoff.as_secs(),
                "Using backoff delay"
            );
            return backoff;
        }
        self.config.next_run_delay()
    }

    async fn run_job<F, Fut>(&self, job: &F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ServerResult<ExpansionReport>>,
    {
        debug!("Starting expansion");
        match job().await {
            Ok(report) => {
                info!(
                    created = report.created,
                    skipped = report.skipped,
                    "Scheduled expansion finished"
                );
                self.state.write().await.record_success(report);
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Scheduled expansion failed");
                let mut state = self.state.write().await;
                state.record_failure(e.to_string());
                if state.consecutive_failures >= self.config.max_consecutive_failures {
                    error!(
                        failures = state.consecutive_failures,
                        max = self.config.max_consecutive_failures,
                        "Max consecutive failures reached, giving up"
                    );
                    state.gave_up = true;
                }
            }
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers an immediate run.
    pub async fn run_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RunNow).await
    }

    pub async fn pause(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns a snapshot of the scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.read().await.paused
    }
}
