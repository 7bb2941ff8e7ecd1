//! Server configuration.

use std::time::Duration;

use gathercal_core::EXPANSION_DAYS;

use crate::scheduler::SchedulerConfig;

/// What the materializer does when a template fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next template.
    #[default]
    ContinueOnError,
    /// Stop the run at the first failing template.
    FailFast,
}

/// Materializer configuration.
#[derive(Debug, Clone, Default)]
pub struct MaterializerConfig {
    pub failure_policy: FailurePolicy,
}

impl MaterializerConfig {
    /// Builder: set failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Calendar read path configuration.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Days after today covered by the upcoming view.
    pub days_ahead: u64,
    /// How long a computed calendar is served from cache.
    pub cache_ttl: Duration,
    /// Attach week page links to day buckets.
    pub week_links: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            days_ahead: EXPANSION_DAYS,
            cache_ttl: Duration::from_secs(300),
            week_links: true,
        }
    }
}

impl CalendarConfig {
    /// Builder: set days ahead.
    pub fn with_days_ahead(mut self, days: u64) -> Self {
        self.days_ahead = days;
        self
    }

    /// Builder: set cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder: set week links.
    pub fn with_week_links(mut self, enabled: bool) -> Self {
        self.week_links = enabled;
        self
    }
}

/// Server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub materializer: MaterializerConfig,
    pub scheduler: SchedulerConfig,
    pub calendar: CalendarConfig,
}

impl ServerConfig {
    /// Builder: set materializer config.
    pub fn with_materializer(mut self, config: MaterializerConfig) -> Self {
        self.materializer = config;
        self
    }

    /// Builder: set scheduler config.
    pub fn with_scheduler(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = config;
        self
    }

    /// Builder: set calendar config.
    pub fn with_calendar(mut self, config: CalendarConfig) -> Self {
        self.calendar = config;
        self
    }
}
