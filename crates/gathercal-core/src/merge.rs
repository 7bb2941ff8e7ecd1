//! Cross-posted event merging.
//!
//! The same real-world event is often submitted independently by several
//! groups. Records are grouped by `(title, eventDate, time-or-TBD)` using
//! exact, case-sensitive comparison. The first record of each group is kept
//! as the primary and every other record published by a different group adds
//! an entry to the primary's "also published by" list.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::event::{CrossReference, MergedEvent, RawEventRecord};
use crate::time::TBD;

/// The identity under which records are considered duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub title: String,
    pub event_date: NaiveDate,
    pub time: String,
}

impl MergeKey {
    /// Builds the key of a record. A missing or empty time becomes `TBD`.
    pub fn of(record: &RawEventRecord) -> Self {
        let time = record
            .time
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(TBD);
        Self {
            title: record.title.clone(),
            event_date: record.event_date,
            time: time.to_string(),
        }
    }
}

/// Merges duplicate records into one [`MergedEvent`] per group.
///
/// Output order follows the first appearance of each group in the input.
pub fn merge_events(records: impl IntoIterator<Item = RawEventRecord>) -> Vec<MergedEvent> {
    let mut index: HashMap<MergeKey, usize> = HashMap::new();
    let mut merged: Vec<MergedEvent> = Vec::new();

    for record in records {
        let key = MergeKey::of(&record);
        match index.get(&key).copied() {
            Some(slot) => {
                let primary = &mut merged[slot];
                if record.source().is_some()
                    && record.source() != primary.event.source()
                    && let Some(xref) = CrossReference::from_record(&record)
                {
                    primary.also_published_by.push(xref);
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(MergedEvent::single(record));
            }
        }
    }

    merged
}
