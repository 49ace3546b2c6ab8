//! Idempotency ledger of completed videos.

mod sqlite;
mod store;

pub use sqlite::SqliteLedger;
pub use store::{LedgerError, ProcessingLedger, ProcessingRecord};
