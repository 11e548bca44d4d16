//! Manifest verification errors

use std::path::PathBuf;
use thiserror::Error;

/// Failures that prevent a verification from producing a report.
///
/// Missing files and digest mismatches are not errors; they are recorded in
/// the report.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Failed to fetch manifest {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Malformed manifest: {0}")]
    Parse(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Cannot derive analysis folder from {url}: missing {marker:?}")]
    FolderDerivation { url: String, marker: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
