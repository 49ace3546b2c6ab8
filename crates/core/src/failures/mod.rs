//! Failure capture: structured error logs plus persisted error records.

mod record;
mod reporter;
mod sqlite;
mod store;

pub use record::{ErrorRecord, ErrorReport, FailureStage};
pub use reporter::ErrorReporter;
pub use sqlite::SqliteErrorStore;
pub use store::{ErrorFilter, ErrorStore, ErrorStoreError};
