use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage at which a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Decode,
    IdempotencyCheck,
    Merge,
    Transcode,
    MarkProcessed,
}

impl FailureStage {
    pub const ALL: [FailureStage; 5] = [
        FailureStage::Decode,
        FailureStage::IdempotencyCheck,
        FailureStage::Merge,
        FailureStage::Transcode,
        FailureStage::MarkProcessed,
    ];

    /// Stable label used in logs, metrics and the error store.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Decode => "decode",
            FailureStage::IdempotencyCheck => "idempotency_check",
            FailureStage::Merge => "merge",
            FailureStage::Transcode => "transcode",
            FailureStage::MarkProcessed => "mark_processed",
        }
    }

    /// Operator-facing description of the failure.
    pub fn message(&self) -> &'static str {
        match self {
            FailureStage::Decode => "Error decoding task",
            FailureStage::IdempotencyCheck => "Error checking processing ledger",
            FailureStage::Merge => "Error merging chunks",
            FailureStage::Transcode => "Error converting video to MPEG-DASH",
            FailureStage::MarkProcessed => "Error marking video as processed",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FailureStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown failure stage: {}", s))
    }
}

/// A failed attempt, captured before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub video_id: i64,
    pub stage: FailureStage,
    pub message: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorReport {
    /// Builds a report stamped with the current time.
    pub fn new(video_id: i64, stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            video_id,
            stage,
            message: stage.message().to_string(),
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// A persisted error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub id: i64,
    pub video_id: i64,
    pub stage: FailureStage,
    pub message: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}
