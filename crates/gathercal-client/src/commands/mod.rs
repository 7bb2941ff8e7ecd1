//! Subcommand implementations.

pub mod calendar;
pub mod config;
pub mod expand;
pub mod occurrences;
pub mod serve;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use gathercal_store::{EventStore, FileStore};

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Opens the configured JSON store.
pub async fn open_store(config: &ClientConfig) -> ClientResult<Arc<FileStore>> {
    let path = config.store_path();
    debug!(path = %path.display(), "Opening store");
    Ok(Arc::new(FileStore::open(path).await?))
}

/// The given date, or today in UTC.
fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Utc::now().date_naive())
}

fn as_dyn(store: Arc<FileStore>) -> Arc<dyn EventStore> {
    store
}
