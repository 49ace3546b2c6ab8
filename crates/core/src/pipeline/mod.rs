//! Pipeline module for assembling uploaded videos.
//!
//! This module provides the `TaskPipeline` which coordinates, per message:
//! - Decoding: Parsing the inbound task
//! - Idempotency: Skipping videos already in the ledger
//! - Merge: Concatenating fragments in order
//! - Transcode: Packaging the merged file as MPEG-DASH
//! - Recording: Marking the video as processed
//!
//! Failures at any stage go to the `ErrorReporter` and leave the video
//! unmarked, so a redelivered message is processed again.
//!
//! # Example
//!
//! ```ignore
//! use chunkcast_core::pipeline::{AssemblyConfig, TaskPipeline};
//! use chunkcast_core::transcoder::{FfmpegTranscoder, TranscoderConfig};
//!
//! let pipeline = TaskPipeline::new(
//!     AssemblyConfig::default(),
//!     ledger,
//!     FfmpegTranscoder::new(TranscoderConfig::default()),
//!     ErrorReporter::new(error_store),
//! );
//!
//! let outcome = pipeline.handle(br#"{"video_id": 42, "path": "/uploads/42"}"#).await;
//! ```

mod config;
mod runner;
mod types;

pub use config::AssemblyConfig;
pub use runner::TaskPipeline;
pub use types::{DecodeError, TaskError, TaskOutcome, VideoTask};
