//! Numeric ordering of fragment file names.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Extracts the ordering key from a fragment file name.
///
/// The key is the first maximal run of decimal digits in the name. Names
/// without digits, or whose digit run does not fit in a `u64`, yield `None`.
/// `None` orders before every `Some`, so malformed fragments are placed first
/// instead of aborting the merge.
pub fn order_key(file_name: &str) -> Option<u64> {
    DIGIT_RUN
        .find(file_name)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// A single uploaded slice of the source video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub path: PathBuf,
    pub file_name: String,
    pub order_key: Option<u64>,
}

impl Fragment {
    /// Builds a fragment from its path. Only the final component is used for ordering.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let order_key = order_key(&file_name);
        Self {
            path,
            file_name,
            order_key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file name carried no usable ordering number.
    pub fn is_malformed(&self) -> bool {
        self.order_key.is_none()
    }
}

impl Ord for Fragment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key
            .cmp(&other.order_key)
            .then_with(|| self.file_name.cmp(&other.file_name))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for Fragment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorts fragments by ordering key, then lexically by file name.
pub fn sort_fragments(fragments: &mut [Fragment]) {
    fragments.sort();
}
