//! The in-memory document shared by the bundled stores.
//!
//! A document holds the three collections the pipeline touches: recurring
//! templates, one-off event records, and materialized instances. The
//! `(parentId, eventDate)` uniqueness of instances is enforced here through
//! a key index rebuilt whenever a document is loaded.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use gathercal_core::{DateWindow, Instance, RawEventRecord, Template};

use crate::store::InsertOutcome;

/// All stored records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub events: Vec<RawEventRecord>,
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(skip)]
    index: HashSet<(String, NaiveDate)>,
}

impl StoreDocument {
    /// Builds a document and indexes its instances.
    pub fn new(
        templates: Vec<Template>,
        events: Vec<RawEventRecord>,
        instances: Vec<Instance>,
    ) -> Self {
        let mut document = Self {
            templates,
            events,
            instances,
            index: HashSet::new(),
        };
        document.reindex();
        document
    }

    /// Rebuilds the instance key index. Must be called after deserializing.
    ///
    /// Duplicate keys already present in the data are kept as-is; only new
    /// inserts are checked.
    pub fn reindex(&mut self) {
        self.index = self
            .instances
            .iter()
            .map(|instance| (instance.parent_id.clone(), instance.event_date))
            .collect();
    }

    /// Templates carrying a non-empty rule.
    pub fn recurring_templates(&self) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|template| template.is_recurring())
            .cloned()
            .collect()
    }

    pub fn has_instance(&self, parent_id: &str, event_date: NaiveDate) -> bool {
        self.index.contains(&(parent_id.to_string(), event_date))
    }

    /// Stores `instance` unless one already exists for its key.
    pub fn insert_instance_if_absent(&mut self, instance: Instance) -> InsertOutcome {
        let key = (instance.parent_id.clone(), instance.event_date);
        if !self.index.insert(key) {
            return InsertOutcome::AlreadyExists;
        }
        self.instances.push(instance);
        InsertOutcome::Created
    }

    /// Stores every instance whose key is free.
    pub fn insert_instances_if_absent(&mut self, instances: Vec<Instance>) -> Vec<InsertOutcome> {
        instances
            .into_iter()
            .map(|instance| self.insert_instance_if_absent(instance))
            .collect()
    }

    /// Removes the `count` most recently inserted instances.
    pub(crate) fn rollback_instances(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(instance) = self.instances.pop() {
                self.index.remove(&(instance.parent_id, instance.event_date));
            }
        }
    }

    /// Event records and instances dated within `window`, ordered by date.
    ///
    /// Within a date, one-off events come before instances and each keeps its
    /// stored order.
    pub fn events_between(&self, window: DateWindow) -> Vec<RawEventRecord> {
        let mut records: Vec<RawEventRecord> = self
            .events
            .iter()
            .filter(|record| window.contains(record.event_date))
            .cloned()
            .chain(
                self.instances
                    .iter()
                    .filter(|instance| window.contains(instance.event_date))
                    .map(Instance::to_record),
            )
            .collect();
        records.sort_by_key(|record| record.event_date);
        records
    }
}
