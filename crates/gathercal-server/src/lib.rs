//! Service layer: materializer, scheduler, calendar read path.
//!
//! This crate provides the parts of gathercal that run against a store:
//! - Expanding recurring templates into dated instances
//! - Running that expansion daily in the background
//! - Building day-bucketed calendars with a TTL cache
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gathercal_server::{Daemon, ServerConfig, SignalHandler};
//! use gathercal_store::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("events.json").await?);
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener()?;
//!
//!     let state = Daemon::new(ServerConfig::default(), store)
//!         .run(signals.shutdown())
//!         .await?;
//!     println!("{} runs", state.runs);
//!     Ok(())
//! }
//! ```

mod cache;
mod calendar;
mod clock;
mod config;
mod daemon;
mod error;
mod materializer;
mod scheduler;
mod signals;

pub use cache::{CacheEntry, CalendarCache};
pub use calendar::CalendarService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CalendarConfig, FailurePolicy, MaterializerConfig, ServerConfig};
pub use daemon::Daemon;
pub use error::{ServerError, ServerResult};
pub use materializer::{
    ExpansionReport, ExpansionSummary, InstanceMaterializer, TemplateFailure, UnrecognizedRule,
};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
