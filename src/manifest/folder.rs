//! Local folder derivation
//!
//! Downloads land in a folder named after the analysis, which is recovered from
//! the metadata URL.

use crate::config::DEFAULT_FOLDER_MARKER;

use super::error::VerifyError;

/// Maps a manifest URL to the local folder holding its files
pub trait FolderResolver: Send + Sync {
    fn folder_for(&self, url: &str) -> Result<String, VerifyError>;
}

impl<F> FolderResolver for F
where
    F: Fn(&str) -> Result<String, VerifyError> + Send + Sync,
{
    fn folder_for(&self, url: &str) -> Result<String, VerifyError> {
        self(url)
    }
}

/// Folder taken from the URL segment that follows a fixed marker
#[derive(Debug, Clone)]
pub struct MarkerFolder {
    marker: String,
}

impl MarkerFolder {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerFolder {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER_MARKER)
    }
}

impl FolderResolver for MarkerFolder {
    fn folder_for(&self, url: &str) -> Result<String, VerifyError> {
        folder_from_url(url, &self.marker)
    }
}

/// Text after `marker` (up to a repeated marker, if any) with every `/` removed
pub fn folder_from_url(url: &str, marker: &str) -> Result<String, VerifyError> {
    let derivation_error = || VerifyError::FolderDerivation {
        url: url.to_string(),
        marker: marker.to_string(),
    };

    if marker.is_empty() {
        return Err(derivation_error());
    }

    url.split(marker)
        .nth(1)
        .map(|rest| rest.replace('/', ""))
        .ok_or_else(derivation_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_after_marker() {
        let resolver = MarkerFolder::default();
        assert_eq!(
            resolver
                .folder_for("https://host/analysisFull/run123/meta.xml")
                .unwrap(),
            "run123meta.xml"
        );
    }

    #[test]
    fn test_every_slash_is_removed() {
        assert_eq!(
            folder_from_url("https://host/cghub/metadata/analysisFull/a1/b2/c3/", "analysisFull/")
                .unwrap(),
            "a1b2c3"
        );
    }

    #[test]
    fn test_plain_analysis_id() {
        assert_eq!(
            folder_from_url(
                "https://gtrepo-ebi.annailabs.com/cghub/metadata/analysisFull/6f3a4c2e-1b7d-4e1f-9a0b-2c5d8e7f9a10",
                "analysisFull/"
            )
            .unwrap(),
            "6f3a4c2e-1b7d-4e1f-9a0b-2c5d8e7f9a10"
        );
    }

    #[test]
    fn test_repeated_marker_stops_at_second_occurrence() {
        assert_eq!(
            folder_from_url("https://host/analysisFull/x/analysisFull/y", "analysisFull/").unwrap(),
            "x"
        );
    }

    #[test]
    fn test_missing_marker() {
        let result = MarkerFolder::default().folder_for("https://host/cghub/metadata/run123");
        assert!(matches!(result, Err(VerifyError::FolderDerivation { .. })));

        assert!(folder_from_url("https://host/analysisFull/x", "").is_err());
    }

    #[test]
    fn test_custom_marker_and_closure_resolvers() {
        let custom = MarkerFolder::new("results/");
        assert_eq!(
            custom.folder_for("s3://bucket/results/batch/7").unwrap(),
            "batch7"
        );

        let fixed = |_: &str| -> Result<String, VerifyError> { Ok("staging".to_string()) };
        assert_eq!(fixed.folder_for("anything").unwrap(), "staging");
    }
}
