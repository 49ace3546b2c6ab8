//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the external transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The process could not be started for a reason other than a missing binary.
    #[error("Failed to start ffmpeg")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// FFmpeg ran and exited unsuccessfully. `output` is the captured stdout and stderr.
    #[error("Failed to convert to MPEG-DASH: ffmpeg exited with {}, output: {output}", describe_exit(.exit_code))]
    ProcessFailed {
        exit_code: Option<i32>,
        output: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl TranscodeError {
    /// Creates a process failure from an exit code and raw captured output.
    pub fn process_failed(exit_code: Option<i32>, output: &[u8]) -> Self {
        Self::ProcessFailed {
            exit_code,
            output: String::from_utf8_lossy(output).to_string(),
        }
    }
}
