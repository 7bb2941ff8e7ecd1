//! The long-running expansion daemon.
//!
//! Wires the materializer to the scheduler: every scheduled run expands the
//! templates for the clock's current date.

use std::sync::Arc;

use tracing::{debug, info};

use gathercal_store::EventStore;

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::materializer::InstanceMaterializer;
use crate::scheduler::{Scheduler, SchedulerHandle, SchedulerState};
use crate::signals::ShutdownSignal;

/// Runs scheduled expansions until shutdown.
pub struct Daemon {
    materializer: Arc<InstanceMaterializer>,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
}

impl Daemon {
    pub fn new(config: ServerConfig, store: Arc<dyn EventStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ServerConfig,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let materializer = Arc::new(InstanceMaterializer::new(store, config.materializer));
        Self {
            materializer,
            clock,
            scheduler: Scheduler::new(config.scheduler),
        }
    }

    /// A handle to control the scheduler while the daemon runs.
    pub fn handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Runs until `shutdown` completes or the scheduler gives up.
    ///
    /// Returns the final scheduler state.
    pub async fn run(self, shutdown: ShutdownSignal) -> ServerResult<SchedulerState> {
        let handle = self.scheduler.handle();
        let materializer = self.materializer;
        let clock = self.clock;

        let mut task = tokio::spawn(self.scheduler.run(move || {
            let materializer = materializer.clone();
            let today = clock.today();
            async move { materializer.run(today).await }
        }));

        info!("Daemon started");
        tokio::select! {
            _ = shutdown.wait() => {
                info!("Shutdown requested, stopping scheduler");
                if handle.stop().await.is_err() {
                    debug!("Scheduler already stopped");
                }
                (&mut task).await.map_err(|e| ServerError::task(e.to_string()))?;
            }
            joined = &mut task => {
                joined.map_err(|e| ServerError::task(e.to_string()))?;
                info!("Scheduler exited");
            }
        }

        Ok(handle.state().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scheduler::SchedulerConfig;
    use crate::signals::SignalHandler;
    use chrono::NaiveDate;
    use gathercal_core::Template;
    use gathercal_store::{ErrorStore, MemoryStore, StoreError};
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn expands_on_start_and_stops_on_shutdown() {
        let store = Arc::new(
            MemoryStore::new().with_templates([Template::new("t1", "Trivia", "WEEKLY:TUE")]),
        );
        let clock = Arc::new(ManualClock::at_date(date(2024, 1, 1)));
        let daemon = Daemon::with_clock(ServerConfig::default(), store.clone(), clock);

        let signals = SignalHandler::new();
        let shutdown = signals.shutdown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown.trigger();
        });

        let state = tokio::time::timeout(Duration::from_secs(1), daemon.run(signals.shutdown()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(state.runs, 1);
        assert_eq!(state.last_report.map(|r| r.created), Some(13));
        assert_eq!(store.instances().await.len(), 13);
    }

    #[tokio::test]
    async fn returns_when_scheduler_gives_up() {
        let store = Arc::new(ErrorStore::new("down", StoreError::unavailable("offline")));
        let config = ServerConfig::default().with_scheduler(
            SchedulerConfig::default()
                .with_backoff(Duration::from_millis(1), Duration::from_millis(1), 1.0)
                .with_max_consecutive_failures(2),
        );
        let daemon = Daemon::new(config, store);
        let signals = SignalHandler::new();

        let state = tokio::time::timeout(Duration::from_secs(1), daemon.run(signals.shutdown()))
            .await
            .unwrap()
            .unwrap();
        assert!(state.gave_up);
        assert!(state.last_error.is_some());
    }
}
