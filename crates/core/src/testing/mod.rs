//! Testing utilities and mock implementations.
//!
//! Lets pipeline tests run without a real ffmpeg:
//!
//! ```rust,ignore
//! use chunkcast_core::testing::{fixtures, MockTranscoder};
//!
//! let transcoder = MockTranscoder::new();
//! transcoder.set_next_error(TranscodeError::process_failed(Some(1), b"boom"));
//!
//! let dir = TempDir::new()?;
//! fixtures::write_fragments(dir.path(), &[("chunk_1.chunk", b"AA"), ("chunk_2.chunk", b"BB")]);
//! ```

mod mock_transcoder;

pub use mock_transcoder::{MockTranscoder, RecordedTranscode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::pipeline::VideoTask;

    /// Write the given fragments into `dir`.
    pub fn write_fragments(dir: &Path, fragments: &[(&str, &[u8])]) {
        for (name, contents) in fragments {
            std::fs::write(dir.join(name), contents).expect("Failed to write fragment");
        }
    }

    /// Serialize a task message for `video_id` pointing at `path`.
    pub fn task_message(video_id: i64, path: &Path) -> Vec<u8> {
        serde_json::to_vec(&VideoTask {
            video_id,
            path: path.to_path_buf(),
        })
        .expect("Failed to serialize task")
    }
}
