//! Task pipeline implementation.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::config::AssemblyConfig;
use super::types::{TaskError, TaskOutcome, VideoTask};
use crate::chunks::{merge_chunks, MergeSummary};
use crate::failures::ErrorReporter;
use crate::ledger::{LedgerError, ProcessingLedger};
use crate::metrics;
use crate::transcoder::Transcoder;

/// Video id recorded for failures that happen before a task is known.
const UNKNOWN_VIDEO_ID: i64 = 0;

/// Drives one message through decode, merge, transcode and recording.
pub struct TaskPipeline<T: Transcoder> {
    config: AssemblyConfig,
    ledger: Arc<dyn ProcessingLedger>,
    transcoder: Arc<T>,
    reporter: ErrorReporter,
}

/// How a decoded task ended, before metrics and reporting.
enum RunResult {
    Completed(MergeSummary),
    AlreadyProcessed,
}

impl<T: Transcoder> TaskPipeline<T> {
    /// Creates a new pipeline.
    pub fn new(
        config: AssemblyConfig,
        ledger: Arc<dyn ProcessingLedger>,
        transcoder: T,
        reporter: ErrorReporter,
    ) -> Self {
        Self::with_shared_transcoder(config, ledger, Arc::new(transcoder), reporter)
    }

    /// Creates a pipeline around a transcoder the caller keeps a handle to.
    pub fn with_shared_transcoder(
        config: AssemblyConfig,
        ledger: Arc<dyn ProcessingLedger>,
        transcoder: Arc<T>,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            config,
            ledger,
            transcoder,
            reporter,
        }
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Handles one raw task message.
    ///
    /// Never returns an error: every failure is reported once and reflected
    /// in the returned outcome, and the video stays unmarked.
    pub async fn handle(&self, raw: &[u8]) -> TaskOutcome {
        let start = Instant::now();

        let outcome = match VideoTask::decode(raw) {
            Ok(task) => self.handle_task(&task).await,
            Err(e) => self.fail(UNKNOWN_VIDEO_ID, TaskError::from(e)),
        };

        metrics::TASKS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        metrics::TASK_DURATION
            .with_label_values(&[outcome.label()])
            .observe(start.elapsed().as_secs_f64());

        outcome
    }

    /// Handles an already decoded task.
    pub async fn handle_task(&self, task: &VideoTask) -> TaskOutcome {
        match self.run(task).await {
            Ok(RunResult::Completed(summary)) => {
                info!(video_id = task.video_id, "Video processing completed");
                TaskOutcome::Completed {
                    video_id: task.video_id,
                    fragments: summary.fragments,
                    bytes: summary.bytes,
                }
            }
            Ok(RunResult::AlreadyProcessed) => TaskOutcome::AlreadyProcessed {
                video_id: task.video_id,
            },
            Err(e) => self.fail(task.video_id, e),
        }
    }

    fn fail(&self, video_id: i64, err: TaskError) -> TaskOutcome {
        let stage = err.stage();
        self.reporter.report(video_id, stage, &err);
        TaskOutcome::Failed { video_id, stage }
    }

    async fn run(&self, task: &VideoTask) -> Result<RunResult, TaskError> {
        let video_id = task.video_id;

        if self
            .ledger
            .is_processed(video_id)
            .map_err(TaskError::IdempotencyCheck)?
        {
            warn!(video_id, "Video already processed");
            return Ok(RunResult::AlreadyProcessed);
        }

        let merged_file = task.merged_file(&self.config);
        let dash_dir = task.dash_dir(&self.config);

        info!(video_id, path = %task.path.display(), "Merging");
        let summary = merge_chunks(&task.path, &merged_file, &self.config.fragment_extension).await?;
        metrics::FRAGMENTS_MERGED.inc_by(summary.fragments as u64);
        metrics::MALFORMED_FRAGMENTS.inc_by(summary.malformed as u64);
        metrics::MERGED_BYTES.inc_by(summary.bytes);
        info!(
            video_id,
            fragments = summary.fragments,
            bytes = summary.bytes,
            "Merged chunks"
        );

        let output = self.transcoder.transcode(&merged_file, &dash_dir).await?;
        metrics::TRANSCODE_DURATION.observe(output.duration_ms as f64 / 1000.0);
        info!(
            video_id,
            manifest = %output.manifest_path.display(),
            duration_ms = output.duration_ms,
            "Converted video to mpeg-dash"
        );

        match self.ledger.mark_processed(video_id) {
            Ok(_) => Ok(RunResult::Completed(summary)),
            Err(LedgerError::AlreadyProcessed(_)) => {
                warn!(
                    video_id,
                    "Video was marked as processed by another worker, keeping existing record"
                );
                Ok(RunResult::AlreadyProcessed)
            }
            Err(e) => Err(TaskError::MarkProcessed(e)),
        }
    }
}
