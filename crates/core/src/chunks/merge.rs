//! Concatenation of ordered fragments into a single file.

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::error::MergeError;
use super::order::{sort_fragments, Fragment};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Path of the merged file.
    pub output_path: PathBuf,
    /// Number of fragments concatenated.
    pub fragments: usize,
    /// Fragments whose names carried no ordering number.
    pub malformed: usize,
    /// Total bytes written.
    pub bytes: u64,
}

/// Lists the fragments in `input_dir` whose extension equals `extension`,
/// in merge order.
///
/// Subdirectories and files with other extensions are ignored.
pub async fn list_fragments(input_dir: &Path, extension: &str) -> Result<Vec<Fragment>, MergeError> {
    let list_err = |source| MergeError::ListFragments {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(input_dir).await.map_err(list_err)?;
    let mut fragments = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        let path = entry.path();
        let matches_extension = path
            .extension()
            .map(|ext| ext == extension)
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }

        let file_type = entry.file_type().await.map_err(list_err)?;
        if !file_type.is_file() {
            continue;
        }

        fragments.push(Fragment::new(path));
    }

    sort_fragments(&mut fragments);
    Ok(fragments)
}

/// Concatenates every fragment in `input_dir` into `output_file`.
///
/// The output is created or truncated. An empty directory produces an empty
/// file. On error, whatever was written so far stays on disk.
pub async fn merge_chunks(
    input_dir: &Path,
    output_file: &Path,
    extension: &str,
) -> Result<MergeSummary, MergeError> {
    let fragments = list_fragments(input_dir, extension).await?;

    let malformed = fragments.iter().filter(|f| f.is_malformed()).count();
    for fragment in fragments.iter().filter(|f| f.is_malformed()) {
        warn!(
            fragment = %fragment.path.display(),
            "Fragment name has no ordering number, placing it first"
        );
    }

    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| MergeError::CreateOutputDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut output = File::create(output_file)
        .await
        .map_err(|source| MergeError::CreateOutput {
            path: output_file.to_path_buf(),
            source,
        })?;

    let mut bytes = 0u64;
    for fragment in &fragments {
        let mut input = File::open(&fragment.path)
            .await
            .map_err(|source| MergeError::OpenFragment {
                path: fragment.path.clone(),
                source,
            })?;

        let copied = tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|source| MergeError::CopyFragment {
                path: fragment.path.clone(),
                source,
            })?;

        debug!(fragment = %fragment.path.display(), bytes = copied, "Appended fragment");
        bytes += copied;
    }

    output
        .flush()
        .await
        .map_err(|source| MergeError::FlushOutput {
            path: output_file.to_path_buf(),
            source,
        })?;

    Ok(MergeSummary {
        output_path: output_file.to_path_buf(),
        fragments: fragments.len(),
        malformed,
        bytes,
    })
}
