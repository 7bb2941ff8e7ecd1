//! Calendar cache with TTL (Time-To-Live) support.
//!
//! Computed calendars are cached per date window. Expiry is measured
//! against an injected [`Clock`] so tests can move time explicitly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use gathercal_core::{DateWindow, DayBucket};

use crate::clock::{Clock, SystemClock};

/// A cached calendar and its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub days: Vec<DayBucket>,
    pub updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(days: Vec<DayBucket>, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            days,
            updated_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Returns true if the entry has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Calendar cache keyed by date window.
pub struct CalendarCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<DateWindow, CacheEntry>,
}

impl std::fmt::Debug for CalendarCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CalendarCache {
    /// Creates a cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached calendar for `window` unless it has expired.
    pub fn get_valid(&self, window: &DateWindow) -> Option<&CacheEntry> {
        let now = self.clock.now();
        self.entries.get(window).filter(|entry| !entry.is_expired(now))
    }

    /// Inserts or replaces the calendar for `window`.
    pub fn insert(&mut self, window: DateWindow, days: Vec<DayBucket>) {
        let entry = CacheEntry::new(days, self.clock.now(), self.ttl);
        if self.entries.insert(window, entry).is_some() {
            debug!(start = %window.start, end = %window.end, "Replaced cache entry");
        } else {
            debug!(start = %window.start, end = %window.end, "Inserted cache entry");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
