//! Manifest verifier
//!
//! Fetch, parse, check presence of every listed file, then (optionally) compare
//! the normalized manifest digest against the expected one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::VerifyConfig;

use super::document::parse_manifest;
use super::error::VerifyError;
use super::fetch::{HttpManifestSource, ManifestSource};
use super::folder::{FolderResolver, MarkerFolder};
use super::normalize::{digest_hex, normalize};

/// Expected vs computed manifest digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCheck {
    pub expected: String,
    pub actual: String,
}

impl DigestCheck {
    /// Exact, case-sensitive comparison
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Outcome of one verification
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub url: String,
    /// Local folder the files were looked up in
    pub folder: PathBuf,
    /// Number of files the manifest lists
    pub expected_files: usize,
    /// Listed files that do not exist locally, in manifest order
    pub missing: Vec<String>,
    /// `None` when no digest was supplied
    pub digest: Option<DigestCheck>,
}

impl VerificationReport {
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn digest_matches(&self) -> bool {
        self.digest.as_ref().map_or(true, DigestCheck::matches)
    }

    pub fn is_valid(&self) -> bool {
        self.all_present() && self.digest_matches()
    }
}

/// Verifies downloaded result sets against their manifests
pub struct ManifestVerifier {
    source: Arc<dyn ManifestSource>,
    resolver: Box<dyn FolderResolver>,
    base_dir: PathBuf,
    patched_path: PathBuf,
}

impl ManifestVerifier {
    pub fn new(source: Arc<dyn ManifestSource>, config: &VerifyConfig) -> Self {
        Self {
            source,
            resolver: Box::new(MarkerFolder::new(config.folder_marker.clone())),
            base_dir: config.base_dir.clone(),
            patched_path: config.patched_path.clone(),
        }
    }

    /// Verifier fetching manifests over HTTP
    pub fn from_config(config: &VerifyConfig) -> Result<Self, VerifyError> {
        let source = HttpManifestSource::new(Duration::from_secs(config.fetch_timeout_secs))?;
        Ok(Self::new(Arc::new(source), config))
    }

    /// Replace how the local folder is derived from the manifest URL
    pub fn with_folder_resolver(mut self, resolver: impl FolderResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn patched_path(&self) -> &Path {
        &self.patched_path
    }

    /// Verify the result set described by the manifest at `url`.
    ///
    /// Every listed file is checked even after the first miss. With an
    /// expected digest, the normalized manifest is written to the patched
    /// path before the digests are compared.
    pub async fn verify(
        &self,
        url: &str,
        expected_digest: Option<&str>,
    ) -> Result<VerificationReport, VerifyError> {
        let data = self.source.fetch(url).await?;
        let manifest = parse_manifest(&data)?;
        let folder = self.base_dir.join(self.resolver.folder_for(url)?);

        tracing::info!(
            url = %url,
            folder = %folder.display(),
            files = manifest.len(),
            "Checking result set"
        );

        let mut missing = Vec::new();
        for filename in manifest.filenames() {
            let path = folder.join(filename);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::warn!(file = %path.display(), "Expected file is missing");
                missing.push(filename.to_string());
            }
        }

        let digest = match expected_digest {
            Some(expected) => Some(self.check_digest(url, &data, expected).await?),
            None => None,
        };

        let report = VerificationReport {
            url: url.to_string(),
            folder,
            expected_files: manifest.len(),
            missing,
            digest,
        };

        if report.is_valid() {
            tracing::info!(url = %url, files = report.expected_files, "Result set verified");
        } else {
            tracing::warn!(
                url = %url,
                missing = report.missing.len(),
                digest_matches = report.digest_matches(),
                "Result set failed verification"
            );
        }

        Ok(report)
    }

    async fn check_digest(
        &self,
        url: &str,
        data: &[u8],
        expected: &str,
    ) -> Result<DigestCheck, VerifyError> {
        let normalized = normalize(data);

        tokio::fs::write(&self.patched_path, &normalized)
            .await
            .map_err(|source| VerifyError::Io {
                path: self.patched_path.clone(),
                source,
            })?;

        let check = DigestCheck {
            expected: expected.to_string(),
            actual: digest_hex(&normalized),
        };

        if !check.matches() {
            tracing::error!(
                expected = %check.expected,
                actual = %check.actual,
                "Manifest digest mismatch for {}",
                url
            );
        }

        Ok(check)
    }
}
