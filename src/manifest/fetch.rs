//! Manifest retrieval

use async_trait::async_trait;
use std::time::Duration;

use super::error::VerifyError;

/// Where manifest documents come from
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the raw manifest bytes for `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, VerifyError>;
}

/// Fetches manifests over HTTP(S) with a single GET, no retries
#[derive(Clone)]
pub struct HttpManifestSource {
    client: reqwest::Client,
}

impl HttpManifestSource {
    pub fn new(timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("store-and-forward/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, VerifyError> {
        let fetch_error = |e: reqwest::Error| VerifyError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        tracing::debug!(url = %url, "Fetching manifest");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?;

        let body = response.bytes().await.map_err(fetch_error)?;

        tracing::debug!(url = %url, bytes = body.len(), "Fetched manifest");

        Ok(body.to_vec())
    }
}
