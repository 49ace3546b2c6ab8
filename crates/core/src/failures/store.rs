use thiserror::Error;

use super::{ErrorRecord, ErrorReport, FailureStage};

#[derive(Debug, Error)]
pub enum ErrorStoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying error records
#[derive(Debug, Clone, Default)]
pub struct ErrorFilter {
    pub video_id: Option<i64>,
    pub stage: Option<FailureStage>,
    pub limit: i64,
    pub offset: i64,
}

impl ErrorFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_video_id(mut self, video_id: i64) -> Self {
        self.video_id = Some(video_id);
        self
    }

    pub fn with_stage(mut self, stage: FailureStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for error record storage. Append-only.
pub trait ErrorStore: Send + Sync {
    /// Insert an error report, returns the assigned ID
    fn insert(&self, report: &ErrorReport) -> Result<i64, ErrorStoreError>;

    /// Query error records, newest first
    fn query(&self, filter: &ErrorFilter) -> Result<Vec<ErrorRecord>, ErrorStoreError>;

    /// Count matching error records
    fn count(&self, filter: &ErrorFilter) -> Result<i64, ErrorStoreError>;
}
