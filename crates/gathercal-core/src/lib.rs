//! Core types: recurrence rules, occurrences, events, locations, merging, calendar buckets

pub mod bucket;
pub mod event;
pub mod location;
pub mod merge;
pub mod occurrence;
pub mod rule;
pub mod time;
pub mod tracing;

pub use bucket::{
    BucketOptions, DayBucket, EventCopy, TimeSlot, build_calendar, bucketize, span_dates_within,
};
pub use event::{CrossReference, Instance, MergedEvent, RawEventRecord, Template};
pub use location::{LocationInfo, NormalizedLocation, is_online_only, normalize_location};
pub use merge::{MergeKey, merge_events};
pub use occurrence::{DateWindow, EXPANSION_DAYS, Occurrences, WindowError};
pub use rule::{RecurrenceRule, RuleError, RuleParse, parse_rule};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
