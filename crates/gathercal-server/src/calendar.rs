//! Calendar read path.
//!
//! Fetches the records of a date window from the store and runs them
//! through the aggregation pipeline (online filtering, location
//! normalization, merging, bucketing). Results are cached per window.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use gathercal_core::time::parse_week_id;
use gathercal_core::{BucketOptions, DateWindow, DayBucket, build_calendar};
use gathercal_store::EventStore;

use crate::cache::CalendarCache;
use crate::clock::{Clock, SystemClock};
use crate::config::CalendarConfig;
use crate::error::{ServerError, ServerResult};

/// Builds day-bucketed calendars from the store.
pub struct CalendarService {
    store: Arc<dyn EventStore>,
    config: CalendarConfig,
    cache: Mutex<CalendarCache>,
}

impl CalendarService {
    pub fn new(store: Arc<dyn EventStore>, config: CalendarConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a service whose cache expires against `clock`.
    pub fn with_clock(
        store: Arc<dyn EventStore>,
        config: CalendarConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = CalendarCache::with_clock(config.cache_ttl, clock);
        Self {
            store,
            config,
            cache: Mutex::new(cache),
        }
    }

    /// The calendar from `today` through `today + days_ahead`.
    pub async fn upcoming(&self, today: NaiveDate) -> ServerResult<Vec<DayBucket>> {
        self.window(DateWindow::forward(today, self.config.days_ahead))
            .await
    }

    /// The calendar of an ISO week such as `2024-W09`, Monday through Sunday.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidWeek`] if `week_id` does not name a week.
    pub async fn week(&self, week_id: &str) -> ServerResult<Vec<DayBucket>> {
        let window = parse_week_id(week_id).ok_or_else(|| ServerError::invalid_week(week_id))?;
        self.window(window).await
    }

    /// The calendar of an arbitrary window.
    ///
    /// Days a multi-day event spans outside the window are not returned.
    #[instrument(skip(self), fields(start = %window.start, end = %window.end))]
    pub async fn window(&self, window: DateWindow) -> ServerResult<Vec<DayBucket>> {
        if let Some(entry) = self.cache.lock().await.get_valid(&window) {
            debug!("Serving calendar from cache");
            return Ok(entry.days.clone());
        }

        let records = self.store.events_between(window).await?;
        let fetched = records.len();
        let options = BucketOptions::default()
            .with_week_links(self.config.week_links)
            .with_window(window);
        let days = build_calendar(records, options);
        debug!(records = fetched, days = days.len(), "Built calendar");

        self.cache.lock().await.insert(window, days.clone());
        Ok(days)
    }
}
