//! Store-and-forward
//!
//! Two tools for moving genomic result sets between sites:
//! - `download_check` confirms a downloaded result set matches its remote
//!   XML manifest (every file present, optional normalized digest).
//! - `s3_push` forwards every file of a local directory into an S3 bucket
//!   with chunked multipart uploads.

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod storage;
pub mod upload;

pub use config::Config;
pub use error::{AppError, Result};
