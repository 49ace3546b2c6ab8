//! FFmpeg-based MPEG-DASH transcoder.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::process::{CommandRunner, TokioCommandRunner};
use super::traits::{TranscodeOutput, Transcoder};

/// FFmpeg-based transcoder producing a DASH manifest and segments.
pub struct FfmpegTranscoder<R: CommandRunner = TokioCommandRunner> {
    config: TranscoderConfig,
    runner: R,
}

impl FfmpegTranscoder<TokioCommandRunner> {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self::with_runner(config, TokioCommandRunner)
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }
}

impl<R: CommandRunner> FfmpegTranscoder<R> {
    /// Creates a transcoder that launches processes through `runner`.
    pub fn with_runner(config: TranscoderConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Builds ffmpeg arguments for DASH packaging.
    fn build_dash_args(&self, input_path: &Path, manifest_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            // Overwrite leftovers from an earlier failed attempt
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
        ];

        args.extend(self.config.extra_args.iter().cloned());

        args.extend([
            "-f".to_string(),
            "dash".to_string(),
            manifest_path.to_string_lossy().to_string(),
        ]);

        args
    }

    fn spawn_error(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscodeError::Spawn { source: e }
        }
    }
}

#[async_trait]
impl<R: CommandRunner> Transcoder for FfmpegTranscoder<R> {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        merged_file: &Path,
        output_dir: &Path,
    ) -> Result<TranscodeOutput, TranscodeError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| TranscodeError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let manifest_path = output_dir.join(&self.config.manifest_name);
        let args = self.build_dash_args(merged_file, &manifest_path);

        info!(
            input = %merged_file.display(),
            manifest = %manifest_path.display(),
            "Converting video to mpeg-dash"
        );
        debug!(args = ?args, "Running ffmpeg");

        let start = Instant::now();
        let output = self
            .runner
            .run(&self.config.ffmpeg_path, &args)
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.success {
            return Err(TranscodeError::ProcessFailed {
                exit_code: output.exit_code,
                output: output.combined_output_lossy(),
            });
        }
        let duration_ms = start.elapsed().as_millis() as u64;

        let merged_file_removed = match tokio::fs::remove_file(merged_file).await {
            Ok(()) => {
                debug!(file = %merged_file.display(), "Removed merged file");
                true
            }
            Err(e) => {
                warn!(
                    file = %merged_file.display(),
                    error = %e,
                    "Failed to remove merged file"
                );
                false
            }
        };

        Ok(TranscodeOutput {
            manifest_path,
            output_dir: output_dir.to_path_buf(),
            duration_ms,
            merged_file_removed,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let output = self
            .runner
            .run(&self.config.ffmpeg_path, &["-version".to_string()])
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.success {
            return Err(TranscodeError::ProcessFailed {
                exit_code: output.exit_code,
                output: output.combined_output_lossy(),
            });
        }

        Ok(())
    }
}
