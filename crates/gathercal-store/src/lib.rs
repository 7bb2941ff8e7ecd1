//! EventStore trait and implementations.
//!
//! This crate provides the persistence seam of the pipeline:
//!
//! - [`EventStore`] - The trait the materializer and calendar read path use
//! - [`MemoryStore`] - In-process store for tests and fixtures
//! - [`FileStore`] - A single JSON document on disk
//! - [`StoreError`] - Error types for store operations
//!
//! # Example
//!
//! ```ignore
//! use gathercal_store::{EventStore, FileStore};
//!
//! let store = FileStore::open("events.json").await?;
//! for template in store.recurring_templates().await? {
//!     println!("{} -> {}", template.id, template.recurrence_rule);
//! }
//! ```

pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use document::StoreDocument;
pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{BoxFuture, ErrorStore, EventStore, InsertOutcome};
