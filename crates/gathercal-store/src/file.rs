//! Event store backed by a single JSON document on disk.
//!
//! The document is loaded once when the store is opened and rewritten after
//! every change. Writes go to a sibling temporary file that is then renamed
//! over the original, so a crash never leaves a half-written store.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use gathercal_core::{DateWindow, Instance, RawEventRecord, Template};

use crate::document::StoreDocument;
use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, EventStore, InsertOutcome};

const BACKEND: &str = "file";

/// An [`EventStore`] persisted as JSON.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: RwLock<StoreDocument>,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut document: StoreDocument = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::from(e).with_backend(BACKEND))?;
                document.reindex();
                info!(
                    path = %path.display(),
                    templates = document.templates.len(),
                    events = document.events.len(),
                    instances = document.instances.len(),
                    "Opened store"
                );
                document
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file missing, starting empty");
                StoreDocument::default()
            }
            Err(e) => return Err(StoreError::from(e).with_backend(BACKEND)),
        };

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn add_template(&self, template: Template) -> StoreResult<()> {
        let mut document = self.document.write().await;
        document.templates.push(template);
        if let Err(e) = self.persist(&document).await {
            document.templates.pop();
            return Err(e);
        }
        Ok(())
    }

    pub async fn add_event(&self, event: RawEventRecord) -> StoreResult<()> {
        let mut document = self.document.write().await;
        document.events.push(event);
        if let Err(e) = self.persist(&document).await {
            document.events.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, document: &StoreDocument) -> StoreResult<()> {
        self.write_document(document)
            .await
            .map_err(|e| e.with_backend(BACKEND))
    }

    async fn write_document(&self, document: &StoreDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl EventStore for FileStore {
    fn name(&self) -> &str {
        BACKEND
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
            if outcome.is_created()
                && let Err(e) = self.persist(&document).await
            {
                warn!(path = %self.path.display(), error = %e, "Failed to persist instance");
                document.rollback_instances(1);
                return Err(e);
            }
            Ok(outcome)
        })
    }

    fn insert_instances_if_absent(
        &self,
        instances: Vec<Instance>,
    ) -> BoxFuture<'_, StoreResult<Vec<InsertOutcome>>> {
        Box::pin(async move {
            let mut document = self.document.write().await;
            let outcomes = document.insert_instances_if_absent(instances);
            let created = outcomes.iter().filter(|o| o.is_created()).count();
            if created > 0 {
                if let Err(e) = self.persist(&document).await {
                    warn!(
                        path = %self.path.display(),
                        created,
                        error = %e,
                        "Failed to persist instances"
                    );
                    document.rollback_instances(created);
                    return Err(e);
                }
                debug!(path = %self.path.display(), created, "Persisted instances");
            }
            Ok(outcomes)
        })
    }

    fn events_between(&self, window: DateWindow) -> BoxFuture<'_, StoreResult<Vec<RawEventRecord>>> {
        Box::pin(async move { Ok(self.document.read().await.events_between(window)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;
    use chrono::Utc;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();
        assert!(store.recurring_templates().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn reads_camel_case_fixture() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{
                "templates": [
                    {"id": "t1", "title": "Rust DC", "recurrenceRule": "MONTHLY:2:WED", "time": "18:30"},
                    {"eventId": "t2", "title": "One-off", "recurrenceRule": ""}
                ],
                "events": [
                    {"id": "e1", "title": "Hack night", "eventDate": "2024-03-01", "location": "Zoom"}
                ]
            }"#,
        )
        .unwrap();

        let store = FileStore::open(&path).await.unwrap();
        let templates = store.recurring_templates().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].recurrence_rule, "MONTHLY:2:WED");
        assert!(templates[0].show_rsvp_list);

        let records = store
            .events_between(DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location.as_deref(), Some("Zoom"));
    }

    #[tokio::test]
    async fn inserted_instances_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let template = Template::new("t1", "Standup", "WEEKLY:MON");
        let day = date(2024, 1, 1);

        {
            let store = FileStore::open(&path).await.unwrap();
            store.add_template(template.clone()).await.unwrap();
            let outcome = store
                .insert_instance_if_absent(Instance::from_template(&template, day, "i1", Utc::now()))
                .await
                .unwrap();
            assert_eq!(outcome, InsertOutcome::Created);
        }

        let reopened = FileStore::open(&path).await.unwrap();
        assert!(reopened.instance_exists("t1", day).await.unwrap());
        let again = reopened
            .insert_instance_if_absent(Instance::from_template(&template, day, "i2", Utc::now()))
            .await
            .unwrap();
        assert_eq!(again, InsertOutcome::AlreadyExists);
        assert_eq!(reopened.recurring_templates().await.unwrap().len(), 1);
    }

    fn weekly_instances(template: &Template, days: &[NaiveDate]) -> Vec<Instance> {
        days.iter()
            .enumerate()
            .map(|(i, day)| Instance::from_template(template, *day, format!("i{i}"), Utc::now()))
            .collect()
    }

    #[tokio::test]
    async fn batch_insert_writes_once_and_skips_taken_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let template = Template::new("t1", "Standup", "WEEKLY:MON");
        let store = FileStore::open(&path).await.unwrap();
        store
            .insert_instance_if_absent(Instance::from_template(
                &template,
                date(2024, 1, 8),
                "existing",
                Utc::now(),
            ))
            .await
            .unwrap();

        let days = [date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)];
        let outcomes = store
            .insert_instances_if_absent(weekly_instances(&template, &days))
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![
                InsertOutcome::Created,
                InsertOutcome::AlreadyExists,
                InsertOutcome::Created
            ]
        );

        let reopened = FileStore::open(&path).await.unwrap();
        for day in days {
            assert!(reopened.instance_exists("t1", day).await.unwrap());
        }
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_batch_keeps_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let store = FileStore::open(&path).await.unwrap();
        let template = Template::new("t1", "Standup", "WEEKLY:MON");

        let days = [date(2024, 1, 1), date(2024, 1, 8)];
        let err = store
            .insert_instances_if_absent(weekly_instances(&template, &days))
            .await
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Io);
        for day in days {
            assert!(!store.instance_exists("t1", day).await.unwrap());
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Corrupt);
        assert_eq!(err.backend(), Some("file"));
    }
}
