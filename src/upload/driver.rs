//! Directory upload driver
//!
//! Pushes every regular file directly inside a directory. Subdirectories and
//! other entries are skipped, files are visited in directory-listing order
//! (not sorted), and the first failing file stops the whole push.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::storage::S3Client;

use super::types::{UploadError, UploadSummary};
use super::uploader::ChunkedUploader;

/// Uploads the top level of a directory, one file at a time
pub struct DirectoryUploader {
    uploader: ChunkedUploader,
}

impl DirectoryUploader {
    pub fn new(uploader: ChunkedUploader) -> Self {
        Self { uploader }
    }

    /// Upload every regular file directly inside `dir`
    pub async fn upload_directory(&self, dir: &Path) -> std::result::Result<UploadSummary, UploadError> {
        let metadata = tokio::fs::metadata(dir)
            .await
            .map_err(|e| UploadError::io(dir, e))?;
        if !metadata.is_dir() {
            return Err(UploadError::NotADirectory(dir.to_path_buf()));
        }

        tracing::info!("Beginning upload of directory {}", dir.display());
        let start = std::time::Instant::now();

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| UploadError::io(dir, e))?;
        let mut summary = UploadSummary::default();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| UploadError::io(dir, e))?
        {
            let path = entry.path();

            // Symlinks count when their target is a regular file
            let is_file = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.is_file(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Cannot stat entry, skipping"
                    );
                    false
                }
            };

            if !is_file {
                tracing::debug!("Skipping non-file entry: {}", path.display());
                summary.skipped.push(path);
                continue;
            }

            let object = self.uploader.upload_file(&path).await?;
            summary.objects.push(object);
        }

        tracing::info!(
            files = summary.objects.len(),
            parts = summary.total_parts(),
            bytes = summary.total_bytes(),
            skipped = summary.skipped.len(),
            "Directory upload complete in {:?}",
            start.elapsed()
        );

        Ok(summary)
    }
}

/// Connect to the configured bucket and push the top level of `dir` into it.
///
/// The client is dropped once the directory has been processed.
pub async fn push_directory(config: &Config, dir: &Path) -> Result<UploadSummary> {
    config.storage.validate()?;
    let client = S3Client::connect(&config.storage).await?;
    tracing::info!(bucket = %client.bucket(), "Pushing {}", dir.display());

    let uploader = ChunkedUploader::new(Arc::new(client), config.upload.clone());
    let summary = DirectoryUploader::new(uploader)
        .upload_directory(dir)
        .await?;

    Ok(summary)
}
