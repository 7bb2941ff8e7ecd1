//! EventStore trait definition.
//!
//! The [`EventStore`] trait is the narrow interface the materializer and the
//! calendar read path use to reach persisted records. Anything that can list
//! templates, insert instances atomically, and return the records of a date
//! window can back the pipeline.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;

use gathercal_core::{DateWindow, Instance, RawEventRecord, Template};

use crate::error::{StoreError, StoreResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so stores can be shared as
/// `Arc<dyn EventStore>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a conditional instance insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The instance was stored.
    Created,
    /// An instance with the same `(parentId, eventDate)` already existed.
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Persistence interface for templates, events, and instances.
///
/// # Implementation Notes
///
/// - `insert_instance_if_absent` must check and write as one operation, so
///   overlapping materializer runs cannot create duplicates. The same holds
///   for every instance of `insert_instances_if_absent`.
/// - `events_between` returns one-off events and instances alike, already in
///   the record shape the read path consumes.
pub trait EventStore: Send + Sync {
    /// Returns the name of this store (e.g. "memory", "file").
    fn name(&self) -> &str;

    /// Lists every template whose recurrence rule is non-empty.
    fn recurring_templates(&self) -> BoxFuture<'_, StoreResult<Vec<Template>>>;

    /// Checks whether an instance exists for `(parent_id, event_date)`.
    fn instance_exists<'a>(
        &'a self,
        parent_id: &'a str,
        event_date: NaiveDate,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    /// Stores `instance` unless its `(parentId, eventDate)` key is taken.
    fn insert_instance_if_absent(
        &self,
        instance: Instance,
    ) -> BoxFuture<'_, StoreResult<InsertOutcome>>;

    /// Stores each of `instances` whose key is free, in order.
    ///
    /// Outcomes line up with the input. Stores that persist on write should
    /// override this to write once per batch; if the batch fails, none of
    /// its instances are kept.
    fn insert_instances_if_absent(
        &self,
        instances: Vec<Instance>,
    ) -> BoxFuture<'_, StoreResult<Vec<InsertOutcome>>> {
        Box::pin(async move {
            let mut outcomes = Vec::with_capacity(instances.len());
            for instance in instances {
                outcomes.push(self.insert_instance_if_absent(instance).await?);
            }
            Ok(outcomes)
        })
    }

    /// Returns the records dated within `window`.
    fn events_between(&self, window: DateWindow) -> BoxFuture<'_, StoreResult<Vec<RawEventRecord>>>;
}

/// A store that fails every call.
///
/// Stands in for a store that could not be opened, and drives error paths
/// in tests.
#[derive(Debug)]
pub struct ErrorStore {
    name: String,
    error: StoreError,
}

impl ErrorStore {
    pub fn new(name: impl Into<String>, error: StoreError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, StoreResult<T>> {
        let error = StoreError::new(self.error.code(), self.error.message()).with_backend(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl EventStore for ErrorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn recurring_templates(&self) -> BoxFuture<'_, StoreResult<Vec<Template>>> {
        self.fail()
    }

    fn instance_exists<'a>(
        &'a self,
        _parent_id: &'a str,
        _event_date: NaiveDate,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.fail()
    }

    fn insert_instance_if_absent(
        &self,
        _instance: Instance,
    ) -> BoxFuture<'_, StoreResult<InsertOutcome>> {
        self.fail()
    }

    fn events_between(&self, _window: DateWindow) -> BoxFuture<'_, StoreResult<Vec<RawEventRecord>>> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;

    #[test]
    fn insert_outcome() {
        assert!(InsertOutcome::Created.is_created());
        assert!(!InsertOutcome::AlreadyExists.is_created());
    }

    #[tokio::test]
    async fn error_store_fails_every_call() {
        let store = ErrorStore::new("broken", StoreError::unavailable("offline"));
        assert_eq!(store.name(), "broken");

        let err = store.recurring_templates().await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Unavailable);
        assert_eq!(err.backend(), Some("broken"));

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(store.instance_exists("t1", day).await.is_err());
        assert!(
            store
                .events_between(DateWindow::new(day, day))
                .await
                .is_err()
        );
    }
}
