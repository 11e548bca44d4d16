//! Chunked Upload Module
//!
//! Pushes local result files into object storage with multipart uploads:
//! - Fixed-size part planning (50 MiB by default)
//! - Byte-range segment reads, one part in memory at a time
//! - Strictly ordered part upload, committed only when every part succeeded
//! - Abort of incomplete sessions on failure
//!
//! Flow per file:
//! 1. Stat the file and plan its parts
//! 2. Initiate a multipart upload keyed by the file's base name
//! 3. Upload parts 1..=N in ascending order
//! 4. Complete the upload (or abort it on the first failure)

pub mod driver;
pub mod segment;
pub mod session;
pub mod types;
pub mod uploader;

pub use driver::{push_directory, DirectoryUploader};
pub use segment::FileSegment;
pub use session::UploadSession;
pub use types::*;
pub use uploader::{progress_percent, ChunkedUploader};
