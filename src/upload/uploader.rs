//! Chunked uploader
//!
//! Uploads one file as a multipart object: plan, initiate, parts in order,
//! complete. The object only becomes visible once every part succeeded.

use std::path::Path;
use std::sync::Arc;
use futures::stream::{self, StreamExt};

use crate::config::UploadConfig;
use crate::storage::{CompletedPartInfo, MultipartStore, MultipartUpload};

use super::segment::FileSegment;
use super::session::UploadSession;
use super::types::{PartPlan, PartRange, UploadError, UploadedObject};

/// Uploads files part by part into a multipart store
#[derive(Clone)]
pub struct ChunkedUploader {
    store: Arc<dyn MultipartStore>,
    config: UploadConfig,
}

impl ChunkedUploader {
    pub fn new(store: Arc<dyn MultipartStore>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload `path` as an object named after its base name.
    ///
    /// Every call opens a fresh session, so uploading the same file twice
    /// produces two independent objects.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedObject, UploadError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::io(path, e))?;
        let size = metadata.len();
        let key = object_key(path)?;
        let plan = PartPlan::new(size, self.config.chunk_size)?;

        tracing::info!(
            file = %path.display(),
            key = %key,
            size = size,
            parts = plan.part_count(),
            "Uploading file"
        );

        let store = self.store.as_ref();
        let mut session = UploadSession::begin(store, &key).await?;

        let result = match self.upload_parts(path, &plan, &mut session).await {
            Ok(()) => session.complete(store).await.map_err(UploadError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::error!(key = %key, error = %e, "Upload failed");
            self.abandon(session).await;
            return Err(e);
        }

        tracing::info!(key = %key, progress = "100%", "Upload complete");

        Ok(UploadedObject {
            key,
            size,
            parts: plan.part_count(),
        })
    }

    /// Upload every planned part, recording each accepted part in the session.
    ///
    /// At most `part_concurrency` parts are in flight and results are consumed
    /// in part order, so the default of 1 is strictly sequential. The first
    /// failure stops the stream; later parts are never started.
    async fn upload_parts(
        &self,
        path: &Path,
        plan: &PartPlan,
        session: &mut UploadSession,
    ) -> Result<(), UploadError> {
        let store = self.store.as_ref();
        let upload = session.upload().clone();
        let part_count = plan.part_count();

        let mut results = stream::iter(plan.parts())
            .map(|range| upload_range(store, &upload, path, range))
            .buffered(self.config.part_concurrency.max(1));

        let mut index = 0;
        while let Some(result) = results.next().await {
            let part = result?;

            tracing::info!(
                key = %upload.key,
                part = part.part_number,
                parts = part_count,
                bytes = part.size,
                progress = %format!("{:.1}%", progress_percent(index, part_count)),
                "Uploaded part"
            );

            session.record_part(part);
            index += 1;
        }

        Ok(())
    }

    async fn abandon(&self, session: UploadSession) {
        if !self.config.abort_incomplete {
            tracing::warn!(
                key = %session.key(),
                upload_id = %session.upload().upload_id,
                parts = session.parts().len(),
                "Leaving incomplete upload session for manual recovery"
            );
            return;
        }

        let key = session.key().to_string();
        if let Err(e) = session.abort(self.store.as_ref()).await {
            tracing::warn!(key = %key, error = %e, "Failed to abort upload session");
        }
    }
}

async fn upload_range(
    store: &dyn MultipartStore,
    upload: &MultipartUpload,
    path: &Path,
    range: PartRange,
) -> Result<CompletedPartInfo, UploadError> {
    let body = FileSegment::open(path, range).await?.read_to_vec().await?;

    store
        .upload_part(upload, range.part_number, body)
        .await
        .map_err(|source| UploadError::PartUpload {
            key: upload.key.clone(),
            part_number: range.part_number,
            source,
        })
}

/// Progress logged after a part, from the 0-based index of that part.
///
/// The first part reports 0% and the last `(n - 1) / n`; 100% is only reported
/// once the upload has been completed.
pub fn progress_percent(index: usize, part_count: usize) -> f64 {
    if part_count == 0 {
        return 0.0;
    }
    index as f64 / part_count as f64 * 100.0
}

/// Object key for a local file: its base name, without any directories
fn object_key(path: &Path) -> Result<String, UploadError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| UploadError::InvalidObjectKey(path.to_path_buf()))
}

// ============================================================================
// Tests
// ============================================================================
