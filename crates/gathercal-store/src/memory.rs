//! In-process event store.

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::trace;

use gathercal_core::{DateWindow, Instance, RawEventRecord, Template};

use crate::document::StoreDocument;
use crate::error::StoreResult;
use crate::store::{BoxFuture, EventStore, InsertOutcome};

/// An [`EventStore`] held entirely in memory.
///
/// Used by tests and by one-shot CLI runs over fixture data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing document.
    pub fn from_document(mut document: StoreDocument) -> Self {
        document.reindex();
        Self {
            document: RwLock::new(document),
        }
    }

    /// Builder method to add templates.
    pub fn with_templates(mut self, templates: impl IntoIterator<Item = Template>) -> Self {
        self.document.get_mut().templates.extend(templates);
        self
    }

    /// Builder method to add one-off event records.
    pub fn with_events(mut self, events: impl IntoIterator<Item = RawEventRecord>) -> Self {
        self.document.get_mut().events.extend(events);
        self
    }

    pub async fn add_template(&self, template: Template) {
        self.document.write().await.templates.push(template);
    }

    pub async fn add_event(&self, event: RawEventRecord) {
        self.document.write().await.events.push(event);
    }

    /// Returns a copy of all stored instances.
    pub async fn instances(&self) -> Vec<Instance> {
        self.document.read().await.instances.clone()
    }

    /// Returns a copy of the whole document.
    pub async fn snapshot(&self) -> StoreDocument {
        self.document.read().await.clone()
    }
}

impl EventStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn recurring_templates(&self) -> BoxFuture<'_, StoreResult<Vec<Template>>> {
        Box::pin(async move { Ok(self.document.read().await.recurring_templates()) })
    }

    fn instance_exists<'a>(
        &'a self,
        parent_id: &'a str,
        event_date: NaiveDate,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(async move { Ok(self.document.read().await.has_instance(parent_id, event_date)) })
    }

    fn insert_instance_if_absent(
        &self,
        instance: Instance,
    ) -> BoxFuture<'_, StoreResult<InsertOutcome>> {
        Box::pin(async move {
            let mut document = self.document.write().await;
            let outcome = document.insert_instance_if_absent(instance);
            trace!(?outcome, "Memory store insert");
            Ok(outcome)
        })
    }

    fn events_between(&self, window: DateWindow) -> BoxFuture<'_, StoreResult<Vec<RawEventRecord>>> {
        Box::pin(async move { Ok(self.document.read().await.events_between(window)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn lists_recurring_templates() {
        let store = MemoryStore::new().with_templates([
            Template::new("t1", "Book club", "MONTHLY:LAST:THU"),
            Template::new("t2", "Launch party", ""),
        ]);
        let templates = store.recurring_templates().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "t1");
    }

    #[tokio::test]
    async fn concurrent_inserts_create_one_instance() {
        let store = Arc::new(MemoryStore::new());
        let template = Template::new("t1", "Standup", "WEEKLY:MON");
        let day = date(2024, 1, 1);

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = Arc::clone(&store);
            let instance = Instance::from_template(&template, day, format!("i{n}"), Utc::now());
            handles.push(tokio::spawn(async move {
                store.insert_instance_if_absent(instance).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_created() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.instances().await.len(), 1);
        assert!(store.instance_exists("t1", day).await.unwrap());
    }

    #[tokio::test]
    async fn instances_are_served_as_records() {
        let template = Template::new("t1", "Standup", "WEEKLY:MON").with_time("09:00");
        let store = MemoryStore::new()
            .with_events([RawEventRecord::new("e1", "Hack night", date(2024, 1, 3))]);
        store
            .insert_instance_if_absent(Instance::from_template(
                &template,
                date(2024, 1, 1),
                "i1",
                Utc::now(),
            ))
            .await
            .unwrap();

        let records = store
            .events_between(DateWindow::new(date(2024, 1, 1), date(2024, 1, 7)))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "i1");
        assert!(records[0].is_recurrence_instance);
        assert_eq!(records[0].parent_id.as_deref(), Some("t1"));
        assert_eq!(records[1].id, "e1");
    }
}
