//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::transcoder::{TranscodeError, TranscodeOutput, Transcoder};

/// A recorded transcode call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    /// The merged input that was passed in.
    pub merged_file: PathBuf,
    /// The requested output directory.
    pub output_dir: PathBuf,
    /// Size of the merged input at call time, if it existed.
    pub input_size: Option<u64>,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Mirrors the file effects of the real transcoder without spawning ffmpeg:
/// - On success, writes a manifest into the output directory and removes the merged file
/// - On an injected failure, leaves the merged file untouched
///
/// Clones share state, so a test can keep one handle while the pipeline owns another.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    manifest_name: String,
    calls: Arc<Mutex<Vec<RecordedTranscode>>>,
    next_error: Arc<Mutex<Option<TranscodeError>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder writing `output.mpd`.
    pub fn new() -> Self {
        Self {
            manifest_name: "output.mpd".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Get all recorded transcode calls.
    pub fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of transcode calls.
    pub fn transcode_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Configure the next transcode to fail with the given error.
    pub fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    fn take_error(&self) -> Option<TranscodeError> {
        self.next_error.lock().unwrap().take()
    }

    fn record(&self, merged_file: &Path, output_dir: &Path, input_size: Option<u64>, success: bool) {
        self.calls.lock().unwrap().push(RecordedTranscode {
            merged_file: merged_file.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            input_size,
            success,
        });
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        merged_file: &Path,
        output_dir: &Path,
    ) -> Result<TranscodeOutput, TranscodeError> {
        let input_size = tokio::fs::metadata(merged_file).await.ok().map(|m| m.len());

        if let Some(err) = self.take_error() {
            self.record(merged_file, output_dir, input_size, false);
            return Err(err);
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| TranscodeError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let manifest_path = output_dir.join(&self.manifest_name);
        tokio::fs::write(&manifest_path, b"<MPD/>")
            .await
            .map_err(|source| TranscodeError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let merged_file_removed = tokio::fs::remove_file(merged_file).await.is_ok();
        self.record(merged_file, output_dir, input_size, true);

        Ok(TranscodeOutput {
            manifest_path,
            output_dir: output_dir.to_path_buf(),
            duration_ms: 0,
            merged_file_removed,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
