//! Error types for fragment merging.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while concatenating fragments.
///
/// Every variant names the path involved. Partial output is left on disk.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to read fragment directory: {path}")]
    ListFragments {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory: {path}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create merged file: {path}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open fragment: {path}")]
    OpenFragment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy fragment {path} into merged file")]
    CopyFragment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flush merged file: {path}")]
    FlushOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// The file or directory the failure is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ListFragments { path, .. }
            | Self::CreateOutputDir { path, .. }
            | Self::CreateOutput { path, .. }
            | Self::OpenFragment { path, .. }
            | Self::CopyFragment { path, .. }
            | Self::FlushOutput { path, .. } => path,
        }
    }
}
