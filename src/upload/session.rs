//! Upload session
//!
//! One multipart upload from initiation to completion or abort. The session
//! accumulates the parts the store accepted. Abort consumes it; a failed
//! completion leaves it in hand so the caller can still abort.

use crate::error::StorageError;
use crate::storage::{CompletedPartInfo, MultipartStore, MultipartUpload};

/// Upload session state
#[derive(Debug)]
pub struct UploadSession {
    upload: MultipartUpload,
    parts: Vec<CompletedPartInfo>,
}

impl UploadSession {
    /// Initiate a multipart upload for `key`
    pub async fn begin(store: &dyn MultipartStore, key: &str) -> Result<Self, StorageError> {
        let upload = store.create_multipart_upload(key).await?;

        tracing::info!(
            key = %upload.key,
            upload_id = %upload.upload_id,
            "Created upload session"
        );

        Ok(Self {
            upload,
            parts: Vec::new(),
        })
    }

    pub fn upload(&self) -> &MultipartUpload {
        &self.upload
    }

    pub fn key(&self) -> &str {
        &self.upload.key
    }

    /// Parts accepted so far, in upload order
    pub fn parts(&self) -> &[CompletedPartInfo] {
        &self.parts
    }

    /// Record a part the store accepted
    pub fn record_part(&mut self, part: CompletedPartInfo) {
        self.parts.push(part);
    }

    /// Bytes accepted so far
    pub fn uploaded_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }

    /// Commit the object. Only after this does it become visible.
    pub async fn complete(&self, store: &dyn MultipartStore) -> Result<(), StorageError> {
        store
            .complete_multipart_upload(&self.upload, &self.parts)
            .await?;

        tracing::info!(
            key = %self.upload.key,
            parts = self.parts.len(),
            bytes = self.uploaded_bytes(),
            "Upload session complete"
        );

        Ok(())
    }

    /// Discard the session and every part stored for it
    pub async fn abort(self, store: &dyn MultipartStore) -> Result<(), StorageError> {
        store.abort_multipart_upload(&self.upload).await?;

        tracing::info!(
            key = %self.upload.key,
            upload_id = %self.upload.upload_id,
            discarded_parts = self.parts.len(),
            "Aborted upload session"
        );

        Ok(())
    }
}
