//! Pipeline lifecycle integration tests.
//!
//! These tests drive the task pipeline with a mock transcoder against real
//! fragment directories and in-memory SQLite stores:
//! - Merge ordering and merged file cleanup
//! - Idempotent redelivery
//! - One error record per failed attempt, at the right stage
//! - Marking races between workers

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use chunkcast_core::{
    testing::{fixtures, MockTranscoder},
    AssemblyConfig, ErrorFilter, ErrorReporter, ErrorStore, FailureStage, LedgerError,
    ProcessingLedger, ProcessingRecord, SqliteErrorStore, SqliteLedger, TaskOutcome,
    TaskPipeline, TranscodeError,
};

/// Test helper to create a pipeline with a shared mock transcoder.
struct TestHarness {
    pipeline: TaskPipeline<MockTranscoder>,
    transcoder: MockTranscoder,
    ledger: Arc<SqliteLedger>,
    errors: Arc<SqliteErrorStore>,
    dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
        Self::with_ledger(ledger.clone(), ledger)
    }

    fn with_ledger(ledger: Arc<SqliteLedger>, pipeline_ledger: Arc<dyn ProcessingLedger>) -> Self {
        let transcoder = MockTranscoder::new();
        let errors = Arc::new(SqliteErrorStore::in_memory().unwrap());
        let pipeline = TaskPipeline::new(
            AssemblyConfig::default(),
            pipeline_ledger,
            transcoder.clone(),
            ErrorReporter::new(errors.clone()),
        );

        Self {
            pipeline,
            transcoder,
            ledger,
            errors,
            dir: TempDir::new().unwrap(),
        }
    }

    fn write_default_fragments(&self) {
        fixtures::write_fragments(
            self.dir.path(),
            &[
                ("chunk_3.chunk", b"CC"),
                ("chunk_1.chunk", b"AA"),
                ("chunk_2.chunk", b"BB"),
            ],
        );
    }

    fn message(&self, video_id: i64) -> Vec<u8> {
        fixtures::task_message(video_id, self.dir.path())
    }

    fn merged_file(&self) -> PathBuf {
        self.dir.path().join("merged.mp4")
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("mpeg-dash").join("output.mpd")
    }

    fn error_count(&self) -> i64 {
        self.errors.count(&ErrorFilter::new()).unwrap()
    }
}

/// Ledger that always reports "not processed", simulating another worker
/// marking the video between our check and our mark.
struct LateCheckLedger {
    inner: Arc<SqliteLedger>,
}

impl ProcessingLedger for LateCheckLedger {
    fn is_processed(&self, _video_id: i64) -> Result<bool, LedgerError> {
        Ok(false)
    }

    fn mark_processed(&self, video_id: i64) -> Result<ProcessingRecord, LedgerError> {
        self.inner.mark_processed(video_id)
    }

    fn get(&self, video_id: i64) -> Result<Option<ProcessingRecord>, LedgerError> {
        self.inner.get(video_id)
    }

    fn count(&self) -> Result<i64, LedgerError> {
        self.inner.count()
    }
}

/// Ledger that can be read but rejects writes, e.g. a read-only database.
struct ReadOnlyLedger;

impl ProcessingLedger for ReadOnlyLedger {
    fn is_processed(&self, _video_id: i64) -> Result<bool, LedgerError> {
        Ok(false)
    }

    fn mark_processed(&self, _video_id: i64) -> Result<ProcessingRecord, LedgerError> {
        Err(LedgerError::Database(
            "attempt to write a readonly database".to_string(),
        ))
    }

    fn get(&self, _video_id: i64) -> Result<Option<ProcessingRecord>, LedgerError> {
        Ok(None)
    }

    fn count(&self) -> Result<i64, LedgerError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_successful_task_merges_transcodes_and_marks() {
    let harness = TestHarness::new();
    harness.write_default_fragments();

    let outcome = harness.pipeline.handle(&harness.message(42)).await;

    assert_eq!(
        outcome,
        TaskOutcome::Completed {
            video_id: 42,
            fragments: 3,
            bytes: 6
        }
    );

    let calls = harness.transcoder.recorded_transcodes();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].merged_file, harness.merged_file());
    assert_eq!(calls[0].output_dir, harness.dir.path().join("mpeg-dash"));
    assert_eq!(calls[0].input_size, Some(6));

    assert!(!harness.merged_file().exists());
    assert!(harness.manifest().exists());
    assert!(harness.ledger.is_processed(42).unwrap());
    assert_eq!(harness.error_count(), 0);
}

#[tokio::test]
async fn test_merged_bytes_follow_numeric_order() {
    let harness = TestHarness::new();
    fixtures::write_fragments(
        harness.dir.path(),
        &[("part10.chunk", b"Z"), ("part2.chunk", b"B"), ("part1.chunk", b"A")],
    );
    // Keep the merged file around to inspect it.
    harness
        .transcoder
        .set_next_error(TranscodeError::process_failed(Some(1), b"stop"));

    harness.pipeline.handle(&harness.message(3)).await;

    assert_eq!(std::fs::read(harness.merged_file()).unwrap(), b"ABZ");
}

#[tokio::test]
async fn test_redelivered_task_is_skipped() {
    let harness = TestHarness::new();
    harness.write_default_fragments();

    let first = harness.pipeline.handle(&harness.message(7)).await;
    assert!(matches!(first, TaskOutcome::Completed { .. }));

    let second = harness.pipeline.handle(&harness.message(7)).await;
    assert_eq!(second, TaskOutcome::AlreadyProcessed { video_id: 7 });

    assert_eq!(harness.transcoder.transcode_count(), 1);
    assert!(!harness.merged_file().exists());
    assert_eq!(harness.ledger.count().unwrap(), 1);
    assert_eq!(harness.error_count(), 0);
}

#[tokio::test]
async fn test_transcode_failure_keeps_merged_file_and_records_error() {
    let harness = TestHarness::new();
    harness.write_default_fragments();
    harness.transcoder.set_next_error(TranscodeError::process_failed(
        Some(1),
        b"merged.mp4: Invalid data found when processing input",
    ));

    let outcome = harness.pipeline.handle(&harness.message(11)).await;

    assert_eq!(
        outcome,
        TaskOutcome::Failed {
            video_id: 11,
            stage: FailureStage::Transcode
        }
    );
    assert_eq!(std::fs::read(harness.merged_file()).unwrap(), b"AABBCC");
    assert!(!harness.ledger.is_processed(11).unwrap());

    let records = harness.errors.query(&ErrorFilter::new()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].video_id, 11);
    assert_eq!(records[0].stage, FailureStage::Transcode);
    assert!(records[0].detail.contains("Invalid data found"));
}

#[tokio::test]
async fn test_failed_task_can_be_retried() {
    let harness = TestHarness::new();
    harness.write_default_fragments();
    harness
        .transcoder
        .set_next_error(TranscodeError::process_failed(None, b""));

    let first = harness.pipeline.handle(&harness.message(12)).await;
    assert!(matches!(first, TaskOutcome::Failed { .. }));

    let second = harness.pipeline.handle(&harness.message(12)).await;
    assert!(matches!(second, TaskOutcome::Completed { bytes: 6, .. }));

    // The stale merged file from the first attempt is truncated, not appended to.
    assert_eq!(harness.transcoder.recorded_transcodes()[1].input_size, Some(6));
    assert!(harness.ledger.is_processed(12).unwrap());
    assert_eq!(harness.error_count(), 1);
}

#[tokio::test]
async fn test_undecodable_message_records_decode_error_only() {
    let harness = TestHarness::new();
    harness.write_default_fragments();

    let outcome = harness.pipeline.handle(br#"{"video_id": "abc"}"#).await;

    assert_eq!(
        outcome,
        TaskOutcome::Failed {
            video_id: 0,
            stage: FailureStage::Decode
        }
    );
    assert_eq!(
        harness
            .errors
            .count(&ErrorFilter::new().with_stage(FailureStage::Decode))
            .unwrap(),
        1
    );
    assert_eq!(harness.error_count(), 1);
    assert_eq!(harness.transcoder.transcode_count(), 0);
    assert!(!harness.merged_file().exists());
    assert_eq!(harness.ledger.count().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_directory_records_merge_error() {
    let harness = TestHarness::new();
    let missing = harness.dir.path().join("never-uploaded");

    let outcome = harness
        .pipeline
        .handle(&fixtures::task_message(5, &missing))
        .await;

    assert_eq!(
        outcome,
        TaskOutcome::Failed {
            video_id: 5,
            stage: FailureStage::Merge
        }
    );
    assert_eq!(harness.transcoder.transcode_count(), 0);
    assert!(!harness.ledger.is_processed(5).unwrap());

    let records = harness
        .errors
        .query(&ErrorFilter::new().with_video_id(5))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].stage, FailureStage::Merge);
    assert_eq!(records[0].message, "Error merging chunks");
}

#[tokio::test]
async fn test_empty_directory_still_reaches_transcoder() {
    let harness = TestHarness::new();

    let outcome = harness.pipeline.handle(&harness.message(6)).await;

    assert_eq!(
        outcome,
        TaskOutcome::Completed {
            video_id: 6,
            fragments: 0,
            bytes: 0
        }
    );
    assert_eq!(harness.transcoder.recorded_transcodes()[0].input_size, Some(0));
}

#[tokio::test]
async fn test_concurrent_mark_is_not_an_error() {
    let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
    let racing: Arc<dyn ProcessingLedger> = Arc::new(LateCheckLedger {
        inner: ledger.clone(),
    });
    let harness = TestHarness::with_ledger(ledger, racing);
    harness.write_default_fragments();

    // Another worker finishes first.
    let existing = harness.ledger.mark_processed(9).unwrap();

    let outcome = harness.pipeline.handle(&harness.message(9)).await;

    assert_eq!(outcome, TaskOutcome::AlreadyProcessed { video_id: 9 });
    assert_eq!(harness.transcoder.transcode_count(), 1);
    assert_eq!(harness.ledger.get(9).unwrap(), Some(existing));
    assert_eq!(harness.error_count(), 0);
}

#[tokio::test]
async fn test_ledger_write_failure_records_mark_processed_error() {
    let unused = Arc::new(SqliteLedger::in_memory().unwrap());
    let harness = TestHarness::with_ledger(unused, Arc::new(ReadOnlyLedger));
    harness.write_default_fragments();

    let outcome = harness.pipeline.handle(&harness.message(4)).await;

    assert_eq!(
        outcome,
        TaskOutcome::Failed {
            video_id: 4,
            stage: FailureStage::MarkProcessed
        }
    );
    // The transcode itself went through before the write was rejected.
    assert_eq!(harness.transcoder.transcode_count(), 1);
    assert!(harness.manifest().exists());

    let records = harness.errors.query(&ErrorFilter::new()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].video_id, 4);
    assert_eq!(records[0].stage, FailureStage::MarkProcessed);
    assert_eq!(records[0].message, "Error marking video as processed");
    assert!(records[0].detail.contains("readonly database"));
}
