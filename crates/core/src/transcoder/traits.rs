//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::TranscodeError;

/// Result of a successful transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    /// Path of the written DASH manifest.
    pub manifest_path: PathBuf,
    /// Directory holding the manifest and its segments.
    pub output_dir: PathBuf,
    /// Wall-clock time spent in the external process.
    pub duration_ms: u64,
    /// Whether the merged input was deleted afterwards.
    pub merged_file_removed: bool,
}

/// A transcoder that packages a merged video for segmented streaming.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Transcodes `merged_file` into `output_dir`.
    ///
    /// Blocks until the external work finishes. Implementations remove the
    /// merged file after success and leave it in place after failure.
    async fn transcode(
        &self,
        merged_file: &Path,
        output_dir: &Path,
    ) -> Result<TranscodeOutput, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}
