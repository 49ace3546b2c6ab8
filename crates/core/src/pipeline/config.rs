//! Configuration for the assembly pipeline.

use serde::{Deserialize, Serialize};

/// File layout used inside each task directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Extension (without dot) identifying fragment files.
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// Name of the merged file written next to the fragments.
    #[serde(default = "default_merged_file_name")]
    pub merged_file_name: String,

    /// Name of the subdirectory receiving the DASH output.
    #[serde(default = "default_dash_dir_name")]
    pub dash_dir_name: String,
}

fn default_fragment_extension() -> String {
    "chunk".to_string()
}

fn default_merged_file_name() -> String {
    "merged.mp4".to_string()
}

fn default_dash_dir_name() -> String {
    "mpeg-dash".to_string()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            fragment_extension: default_fragment_extension(),
            merged_file_name: default_merged_file_name(),
            dash_dir_name: default_dash_dir_name(),
        }
    }
}
