//! Newline-delimited task intake.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use chunkcast_core::{TaskOutcome, TaskPipeline, Transcoder};

/// Tally of messages handled by [`consume_lines`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub completed: usize,
    pub already_processed: usize,
    pub failed: usize,
}

impl ConsumeSummary {
    pub fn handled(&self) -> usize {
        self.completed + self.already_processed + self.failed
    }

    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed { .. } => self.completed += 1,
            TaskOutcome::AlreadyProcessed { .. } => self.already_processed += 1,
            TaskOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Feeds each non-blank line of `reader` to the pipeline, one at a time.
///
/// Stops at EOF or once `shutdown` resolves. A task already in progress is
/// finished before stopping. Lines are passed through as raw bytes, so
/// invalid UTF-8 ends up as a decode failure rather than an I/O error.
pub async fn consume_lines<R, T, S>(
    reader: R,
    pipeline: &TaskPipeline<T>,
    shutdown: S,
) -> std::io::Result<ConsumeSummary>
where
    R: AsyncBufRead + Unpin,
    T: Transcoder,
    S: Future<Output = ()>,
{
    let mut reader = reader;
    let mut summary = ConsumeSummary::default();
    let mut line = Vec::new();
    tokio::pin!(shutdown);

    loop {
        // read_until keeps partial input in `line` if shutdown wins the race.
        let read = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer reading tasks");
                break;
            }
            read = reader.read_until(b'\n', &mut line) => read?,
        };

        if read == 0 {
            info!("Input closed");
            break;
        }

        let message = line.trim_ascii();
        if !message.is_empty() {
            let outcome = pipeline.handle(message).await;
            summary.record(&outcome);
        }
        line.clear();
    }

    Ok(summary)
}
