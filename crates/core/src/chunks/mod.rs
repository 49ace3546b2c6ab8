//! Fragment ordering and byte-exact concatenation.
//!
//! Uploaded videos arrive as a directory of `*.chunk` files. The number
//! embedded in each file name decides its position in the reconstructed
//! stream:
//!
//! ```ignore
//! use chunkcast_core::chunks::merge_chunks;
//!
//! let summary = merge_chunks(Path::new("/uploads/42"), Path::new("/uploads/42/merged.mp4"), "chunk").await?;
//! println!("Merged {} fragments ({} bytes)", summary.fragments, summary.bytes);
//! ```

mod error;
mod merge;
mod order;

pub use error::MergeError;
pub use merge::{list_fragments, merge_chunks, MergeSummary};
pub use order::{order_key, sort_fragments, Fragment};
