//! Task types for the assembly pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::config::AssemblyConfig;
use crate::chunks::MergeError;
use crate::failures::FailureStage;
use crate::ledger::LedgerError;
use crate::transcoder::TranscodeError;

/// Inbound message could not be decoded into a task.
#[derive(Debug, Error)]
#[error("Invalid task message")]
pub struct DecodeError(#[from] serde_json::Error);

/// One unit of work: a directory of fragments belonging to a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTask {
    pub video_id: i64,
    pub path: PathBuf,
}

impl VideoTask {
    /// Decodes a raw `{"video_id": .., "path": ..}` message.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Location of the merged file for this task.
    pub fn merged_file(&self, config: &AssemblyConfig) -> PathBuf {
        self.path.join(&config.merged_file_name)
    }

    /// Location of the DASH output directory for this task.
    pub fn dash_dir(&self, config: &AssemblyConfig) -> PathBuf {
        self.path.join(&config.dash_dir_name)
    }
}

/// A stage failure inside a pipeline run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to check processing ledger")]
    IdempotencyCheck(#[source] LedgerError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("Failed to mark video as processed")]
    MarkProcessed(#[source] LedgerError),
}

impl TaskError {
    /// The stage this error aborted.
    pub fn stage(&self) -> FailureStage {
        match self {
            TaskError::Decode(_) => FailureStage::Decode,
            TaskError::IdempotencyCheck(_) => FailureStage::IdempotencyCheck,
            TaskError::Merge(_) => FailureStage::Merge,
            TaskError::Transcode(_) => FailureStage::Transcode,
            TaskError::MarkProcessed(_) => FailureStage::MarkProcessed,
        }
    }
}

/// What happened to a handled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Merged, transcoded and recorded.
    Completed {
        video_id: i64,
        fragments: usize,
        bytes: u64,
    },
    /// Skipped because the ledger already had the video.
    AlreadyProcessed { video_id: i64 },
    /// Aborted at `stage`; an error record was written.
    Failed { video_id: i64, stage: FailureStage },
}

impl TaskOutcome {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Completed { .. } => "completed",
            TaskOutcome::AlreadyProcessed { .. } => "already_processed",
            TaskOutcome::Failed { .. } => "failed",
        }
    }
}
