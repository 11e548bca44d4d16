//! S3-compatible storage client
//!
//! Wraps the AWS SDK for S3-compatible multipart uploads.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{http::HttpResponse, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    operation::head_bucket::HeadBucketError,
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};

use crate::config::StorageConfig;
use crate::error::StorageError;

use super::types::{CompletedPartInfo, MultipartStore, MultipartUpload};

/// S3-compatible storage client bound to one bucket
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Connect and resolve the configured bucket.
    ///
    /// Explicit keys in the configuration win; otherwise the default AWS
    /// credential chain is used.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "store-and-forward",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.provider.force_path_style());

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());
        let bucket = config.bucket.clone();

        tracing::info!(bucket = %bucket, "Connecting to bucket");
        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .map_err(|e| head_bucket_error(&bucket, e))?;
        tracing::info!("Connected to S3 bucket: {}", bucket);

        Ok(Self { client, bucket })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl MultipartStore for S3Client {
    async fn create_multipart_upload(&self, key: &str) -> Result<MultipartUpload, StorageError> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(&format!("Failed to initiate upload of {}", key), e))?;

        let upload_id = response
            .upload_id()
            .ok_or_else(|| StorageError::MissingField {
                field: "upload id",
                key: key.to_string(),
            })?
            .to_string();

        tracing::debug!(key = %key, upload_id = %upload_id, "Initiated multipart upload");

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
        let size = body.len() as u64;

        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .part_number(part_number)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                sdk_error(
                    &format!("Failed to upload part {} of {}", part_number, upload.key),
                    e,
                )
            })?;

        let e_tag = response
            .e_tag()
            .ok_or_else(|| StorageError::MissingField {
                field: "ETag",
                key: upload.key.clone(),
            })?
            .to_string();

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
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .e_tag(&part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| sdk_error(&format!("Failed to complete upload of {}", upload.key), e))?;

        Ok(())
    }

    async fn abort_multipart_upload(&self, upload: &MultipartUpload) -> Result<(), StorageError> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(&upload.key)
            .upload_id(&upload.upload_id)
            .send()
            .await
            .map_err(|e| sdk_error(&format!("Failed to abort upload of {}", upload.key), e))?;

        Ok(())
    }
}

fn head_bucket_error(bucket: &str, err: SdkError<HeadBucketError, HttpResponse>) -> StorageError {
    match &err {
        SdkError::ServiceError(service) if service.err().is_not_found() => {
            StorageError::BucketNotFound(bucket.to_string())
        }
        SdkError::ServiceError(service) if service.raw().status().as_u16() == 403 => {
            StorageError::AccessDenied(bucket.to_string())
        }
        _ => StorageError::ConnectionFailed(format!("{}", DisplayErrorContext(&err))),
    }
}

fn sdk_error<E>(context: &str, err: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::SdkError(format!("{}: {}", context, DisplayErrorContext(&err)))
}
