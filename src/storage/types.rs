//! Storage types

use async_trait::async_trait;

use crate::error::StorageError;

/// Identifies one in-progress multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    /// Object key the upload will become once completed
    pub key: String,
    /// Upload id issued by the store on initiation
    pub upload_id: String,
}

/// A part the store has accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPartInfo {
    /// 1-based part number
    pub part_number: i32,
    pub e_tag: String,
    pub size: u64,
}

/// Multipart-upload protocol of an object store
///
/// Initiation, part upload, completion and abort, one call each. Nothing is
/// visible under the key until `complete_multipart_upload` succeeds.
#[async_trait]
pub trait MultipartStore: Send + Sync {
    /// Start a multipart upload for `key`
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError>;

    /// Upload one part of an open upload
    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<CompletedPartInfo, StorageError>;

    /// Commit the upload from the given parts (ascending part number)
    async fn complete_multipart_upload(
        &self,
        upload: &MultipartUpload,
        parts: &[CompletedPartInfo],
    ) -> Result<(), StorageError>;

    /// Discard an open upload and every part stored for it
    async fn abort_multipart_upload(&self, upload: &MultipartUpload) -> Result<(), StorageError>;
}
