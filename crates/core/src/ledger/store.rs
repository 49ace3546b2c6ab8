use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record for this video already exists (uniqueness constraint).
    #[error("Video {0} is already marked as processed")]
    AlreadyProcessed(i64),

    #[error("Database error: {0}")]
    Database(String),
}

/// Durable fact that a video finished processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingRecord {
    pub video_id: i64,
    pub processed_at: DateTime<Utc>,
}

/// Trait for the processed-video ledger.
///
/// Records are append-only: there is no update or delete.
pub trait ProcessingLedger: Send + Sync {
    /// Whether a record exists for `video_id`. Absence means not processed.
    fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError>;

    /// Insert the record for `video_id`.
    ///
    /// Fails with `LedgerError::AlreadyProcessed` if one already exists.
    fn mark_processed(&self, video_id: i64) -> Result<ProcessingRecord, LedgerError>;

    /// Fetch the record for `video_id`, if any.
    fn get(&self, video_id: i64) -> Result<Option<ProcessingRecord>, LedgerError>;

    /// Number of processed videos.
    fn count(&self) -> Result<i64, LedgerError>;
}
