//! Error types for the store-and-forward tools

use thiserror::Error;

use crate::manifest::VerifyError;
use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("S3 error: {0}")]
    Storage(#[from] StorageError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// Every failure maps to 1; the variants only differ in what gets logged.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 1,
            AppError::Storage(_) => 1,
            AppError::Upload(_) => 1,
            AppError::Verify(_) => 1,
        }
    }

    /// Whether the failure happened while talking to object storage
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_)
                | AppError::Upload(UploadError::Storage(_))
                | AppError::Upload(UploadError::PartUpload { .. })
        )
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("S3 connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("S3 response missing {field} for {key}")]
    MissingField { field: &'static str, key: String },

    #[error("S3 SDK error: {0}")]
    SdkError(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}
