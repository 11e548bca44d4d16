//! Configuration management for the store-and-forward tools

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default part size: 50 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 50 * 1024 * 1024;

/// Smallest non-final part S3 accepts: 5 MiB
pub const MIN_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Marker preceding the analysis folder in metadata URLs
pub const DEFAULT_FOLDER_MARKER: &str = "analysisFull/";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    /// Custom endpoint; `None` talks to AWS S3 directly
    pub endpoint: Option<String>,
    pub bucket: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Minio,
    R2,
    S3,
    B2,
}

impl StorageConfig {
    /// Reject settings that cannot reach a bucket
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("S3_BUCKET"));
        }

        match (&self.access_key, &self.secret_key) {
            (Some(_), None) => Err(ConfigError::Missing("S3_SECRET_KEY")),
            (None, Some(_)) => Err(ConfigError::Missing("S3_ACCESS_KEY")),
            _ => Ok(()),
        }
    }
}

impl StorageProvider {
    /// MinIO-style endpoints only resolve path-style bucket addressing
    pub fn force_path_style(&self) -> bool {
        matches!(self, StorageProvider::Minio)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Bytes per multipart part
    pub chunk_size: u64,
    /// Parts kept in flight per file (1 = strictly sequential)
    pub part_concurrency: usize,
    /// Abort the multipart session when a file fails
    pub abort_incomplete: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyConfig {
    pub folder_marker: String,
    /// Directory the derived analysis folder is resolved against
    pub base_dir: PathBuf,
    /// Where the normalized manifest is written before hashing
    pub patched_path: PathBuf,
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                provider: StorageProvider::S3,
                endpoint: None,
                bucket: String::new(),
                access_key: None,
                secret_key: None,
                region: Some("us-east-1".to_string()),
            },
            upload: UploadConfig::default(),
            verify: VerifyConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            part_concurrency: 1,
            abort_incomplete: true,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            folder_marker: DEFAULT_FOLDER_MARKER.to_string(),
            base_dir: PathBuf::from("."),
            patched_path: PathBuf::from("patched.xml"),
            fetch_timeout_secs: 300,
        }
    }
}

impl Config {
    /// Build configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let provider = match lookup("S3_PROVIDER").as_deref() {
            None => defaults.storage.provider,
            Some("minio") => StorageProvider::Minio,
            Some("r2") => StorageProvider::R2,
            Some("s3") => StorageProvider::S3,
            Some("b2") => StorageProvider::B2,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "S3_PROVIDER",
                    value: other.to_string(),
                    reason: "expected one of minio, r2, s3, b2".to_string(),
                })
            }
        };

        let chunk_size = parse_var(&lookup, "UPLOAD_CHUNK_SIZE", defaults.upload.chunk_size)?;
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::Invalid {
                var: "UPLOAD_CHUNK_SIZE",
                value: chunk_size.to_string(),
                reason: format!("must be at least {} bytes", MIN_CHUNK_SIZE),
            });
        }

        let part_concurrency = parse_var(
            &lookup,
            "UPLOAD_PART_CONCURRENCY",
            defaults.upload.part_concurrency,
        )?;
        if part_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "UPLOAD_PART_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            storage: StorageConfig {
                provider,
                endpoint: lookup("S3_ENDPOINT").filter(|s| !s.is_empty()),
                bucket: lookup("S3_BUCKET").unwrap_or(defaults.storage.bucket),
                access_key: lookup("S3_ACCESS_KEY"),
                secret_key: lookup("S3_SECRET_KEY"),
                region: lookup("S3_REGION").or(defaults.storage.region),
            },
            upload: UploadConfig {
                chunk_size,
                part_concurrency,
                abort_incomplete: parse_bool(
                    &lookup,
                    "UPLOAD_ABORT_INCOMPLETE",
                    defaults.upload.abort_incomplete,
                )?,
            },
            verify: VerifyConfig {
                folder_marker: lookup("MANIFEST_FOLDER_MARKER")
                    .unwrap_or(defaults.verify.folder_marker),
                base_dir: lookup("MANIFEST_BASE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.verify.base_dir),
                patched_path: lookup("MANIFEST_PATCHED_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.verify.patched_path),
                fetch_timeout_secs: parse_var(
                    &lookup,
                    "MANIFEST_FETCH_TIMEOUT_SECS",
                    defaults.verify.fetch_timeout_secs,
                )?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).map(|v| v.trim().to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            var,
            value: other.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
