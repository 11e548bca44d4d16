//! In-memory multipart store for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

use super::types::{CompletedPartInfo, MultipartStore, MultipartUpload};

/// Calls observed by the store, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Create { key: String },
    Part { key: String, part_number: i32, size: u64 },
    Complete { key: String, parts: Vec<i32> },
    Abort { key: String },
}

/// Multipart store that keeps everything in memory and records every call
#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicUsize,
    events: Mutex<Vec<StoreEvent>>,
    pending: Mutex<HashMap<String, HashMap<i32, Vec<u8>>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_part: Option<i32>,
    discard_data: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upload of `part_number`
    pub fn failing_part(part_number: i32) -> Self {
        Self {
            fail_part: Some(part_number),
            ..Self::default()
        }
    }

    /// Record calls but drop part bodies, for large uploads
    pub fn discarding() -> Self {
        Self {
            discard_data: true,
            ..Self::default()
        }
    }

    pub async fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().await.clone()
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn open_uploads(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[async_trait]
impl MultipartStore for MemoryStore {
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError> {
        let upload_id = format!("upload-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);

        self.pending
            .lock()
            .await
            .insert(upload_id.clone(), HashMap::new());
        self.events.lock().await.push(StoreEvent::Create {
            key: key.to_string(),
        });

        Ok(MultipartUpload {
            key: key.to_string(),
            upload_id,
        })
    }

    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<CompletedPartInfo, StorageError> {
        if self.fail_part == Some(part_number) {
            return Err(StorageError::SdkError(format!(
                "connection reset during part {}",
                part_number
            )));
        }

        let size = body.len() as u64;
        let e_tag = format!("\"{:x}\"", md5::compute(&body));

        let mut pending = self.pending.lock().await;
        let parts = pending
            .get_mut(&upload.upload_id)
            .ok_or_else(|| StorageError::SdkError(format!("NoSuchUpload: {}", upload.upload_id)))?;
        parts.insert(part_number, if self.discard_data { Vec::new() } else { body });

        self.events.lock().await.push(StoreEvent::Part {
            key: upload.key.clone(),
            part_number,
            size,
        });

        Ok(CompletedPartInfo {
            part_number,
            e_tag,
            size,
        })
    }

    async fn complete_multipart_upload(
        &self,
        upload: &MultipartUpload,
        parts: &[CompletedPartInfo],
    ) -> Result<(), StorageError> {
        let mut stored = self
            .pending
            .lock()
            .await
            .remove(&upload.upload_id)
            .ok_or_else(|| StorageError::SdkError(format!("NoSuchUpload: {}", upload.upload_id)))?;

        let mut data = Vec::new();
        for part in parts {
            let bytes = stored.remove(&part.part_number).ok_or_else(|| {
                StorageError::SdkError(format!("InvalidPart: {}", part.part_number))
            })?;
            data.extend_from_slice(&bytes);
        }

        self.objects.lock().await.insert(upload.key.clone(), data);
        self.events.lock().await.push(StoreEvent::Complete {
            key: upload.key.clone(),
            parts: parts.iter().map(|p| p.part_number).collect(),
        });

        Ok(())
    }

    async fn abort_multipart_upload(&self, upload: &MultipartUpload) -> Result<(), StorageError> {
        self.pending.lock().await.remove(&upload.upload_id);
        self.events.lock().await.push(StoreEvent::Abort {
            key: upload.key.clone(),
        });
        Ok(())
    }
}
