//! Transcoder module for packaging merged videos as MPEG-DASH.
//!
//! This module provides the `Transcoder` trait and an FFmpeg-backed
//! implementation. The external process is reached through a `CommandRunner`,
//! so tests can substitute a fake without spawning anything.
//!
//! # Example
//!
//! ```ignore
//! use chunkcast_core::transcoder::{FfmpegTranscoder, Transcoder, TranscoderConfig};
//!
//! let transcoder = FfmpegTranscoder::new(TranscoderConfig::default());
//! transcoder.validate().await?;
//!
//! let output = transcoder
//!     .transcode(Path::new("/uploads/42/merged.mp4"), Path::new("/uploads/42/mpeg-dash"))
//!     .await?;
//! println!("Manifest written to {}", output.manifest_path.display());
//! ```

mod config;
mod error;
mod ffmpeg;
mod process;
mod traits;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use process::{CommandRunner, ProcessOutput, TokioCommandRunner};
pub use traits::{TranscodeOutput, Transcoder};
