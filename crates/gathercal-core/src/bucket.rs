//! Calendar bucketing.
//!
//! Turns merged events into a day-by-day, time-slotted view:
//!
//! 1. Each event is expanded across every date from its start through a
//!    parseable end date (inclusive). Copies after the first day are
//!    continuations and get a `(continuing)` display title. With a window
//!    in [`BucketOptions`], only the days inside it are produced.
//! 2. Copies are grouped by date, then by time label. Events without a
//!    usable `H:MM` time go in the `TBD` slot.
//! 3. Dates ascend; time slots ascend by `(hour, minute)` with `TBD` last;
//!    events within a slot ascend by title (case-sensitive).
//!
//! [`build_calendar`] runs the full read path over raw storage records:
//! online filtering, location normalization, merging, then bucketing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{MergedEvent, RawEventRecord};
use crate::location::{is_online_only, normalize_record};
use crate::merge::merge_events;
use crate::occurrence::DateWindow;
use crate::time::{TBD, format_time, parse_time_of_day, short_date, week_url};

/// Appended to the display title of continuation-day copies.
pub const CONTINUATION_SUFFIX: &str = " (continuing)";

/// Sort key of the `TBD` slot, after every real time.
const TBD_SORT_KEY: (u32, u32) = (24, 0);

/// Options for bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketOptions {
    /// Attach a week page link to every day bucket.
    pub week_links: bool,
    /// Only produce buckets for days inside this window.
    pub window: Option<DateWindow>,
}

impl BucketOptions {
    /// Builder method to enable week links.
    pub fn with_week_links(mut self, enabled: bool) -> Self {
        self.week_links = enabled;
        self
    }

    /// Builder method to restrict output to `window`.
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// One event placed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCopy {
    #[serde(flatten)]
    pub event: MergedEvent,
    /// Title as shown; suffixed on continuation days.
    pub display_title: String,
    /// 12-hour time, or `TBD`.
    pub formatted_time: String,
    /// True on every day after the first of a multi-day event.
    pub is_continuation: bool,
}

impl EventCopy {
    /// The original, unsuffixed title.
    pub fn title(&self) -> &str {
        &self.event.event.title
    }
}

/// Events sharing a time label within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub events: Vec<EventCopy>,
}

/// A single date with its ordered time slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub short_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_url: Option<String>,
    pub has_events: bool,
    pub time_slots: Vec<TimeSlot>,
}

impl DayBucket {
    /// Total number of event copies on this day.
    pub fn event_count(&self) -> usize {
        self.time_slots.iter().map(|slot| slot.events.len()).sum()
    }
}

/// A resolved time label.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TimeLabel {
    label: String,
    formatted: String,
    parsed: Option<(u32, u32)>,
}

impl TimeLabel {
    fn of(time: Option<&str>) -> Self {
        match time.and_then(|t| parse_time_of_day(t).map(|hm| (t.trim(), hm))) {
            Some((label, (hour, minute))) => Self {
                label: label.to_string(),
                formatted: format_time(hour, minute),
                parsed: Some((hour, minute)),
            },
            None => Self {
                label: TBD.to_string(),
                formatted: TBD.to_string(),
                parsed: None,
            },
        }
    }
}

fn slot_sort_key(label: &str) -> (u32, u32) {
    parse_time_of_day(label).unwrap_or(TBD_SORT_KEY)
}

/// Last day an event covers.
///
/// An end date that fails to parse, or is not after the start, yields the
/// start date.
fn span_end(event: &RawEventRecord) -> NaiveDate {
    let start = event.event_date;
    event
        .end_date
        .as_deref()
        .and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok())
        .filter(|end| *end > start)
        .unwrap_or(start)
}

/// Returns every date an event covers.
pub fn span_dates(event: &RawEventRecord) -> Vec<NaiveDate> {
    let end = span_end(event);
    event
        .event_date
        .iter_days()
        .take_while(|day| *day <= end)
        .collect()
}

/// Returns the dates an event covers that fall inside `window`.
///
/// Only the overlap is walked, so a far-off end date costs nothing.
pub fn span_dates_within(event: &RawEventRecord, window: DateWindow) -> Vec<NaiveDate> {
    let start = event.event_date.max(window.start);
    let end = span_end(event).min(window.end);
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Groups merged events into sorted day buckets.
pub fn bucketize(
    events: impl IntoIterator<Item = MergedEvent>,
    options: BucketOptions,
) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();

    for merged in events {
        let label = TimeLabel::of(merged.event.time.as_deref());
        let dates = match options.window {
            Some(window) => span_dates_within(&merged.event, window),
            None => span_dates(&merged.event),
        };
        for date in dates {
            let copy = make_copy(&merged, &label, date > merged.event.event_date);
            let slots = days.entry(date).or_default();
            match slots.iter_mut().find(|slot| slot.time == label.label) {
                Some(slot) => slot.events.push(copy),
                None => slots.push(TimeSlot {
                    time: label.label.clone(),
                    events: vec![copy],
                }),
            }
        }
    }

    days.into_iter()
        .map(|(date, mut slots)| {
            slots.sort_by(|a, b| {
                slot_sort_key(&a.time)
                    .cmp(&slot_sort_key(&b.time))
                    .then_with(|| a.time.cmp(&b.time))
            });
            for slot in &mut slots {
                slot.events.sort_by(|a, b| a.title().cmp(b.title()));
            }
            DayBucket {
                date,
                short_date: short_date(date),
                week_url: options.week_links.then(|| week_url(date)),
                has_events: !slots.is_empty(),
                time_slots: slots,
            }
        })
        .collect()
}

fn make_copy(merged: &MergedEvent, label: &TimeLabel, continuation: bool) -> EventCopy {
    let mut event = merged.clone();
    event.event.time = label.parsed.map(|_| label.label.clone());

    let display_title = if continuation {
        format!("{}{}", merged.event.title, CONTINUATION_SUFFIX)
    } else {
        merged.event.title.clone()
    };

    EventCopy {
        event,
        display_title,
        formatted_time: label.formatted.clone(),
        is_continuation: continuation,
    }
}

/// Runs the read path over raw records.
///
/// Online-only events are dropped, locations normalized, duplicates merged,
/// and the result bucketed.
pub fn build_calendar(
    records: impl IntoIterator<Item = RawEventRecord>,
    options: BucketOptions,
) -> Vec<DayBucket> {
    let in_person = records
        .into_iter()
        .filter(|record| !is_online_only(record.location.as_deref()))
        .map(|mut record| {
            normalize_record(&mut record);
            record
        });
    bucketize(merge_events(in_person), options)
}
