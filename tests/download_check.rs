//! End-to-end verification against manifests served over HTTP

use std::net::SocketAddr;
use std::path::Path;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use store_and_forward::config::VerifyConfig;
use store_and_forward::manifest::{digest_hex, normalize, ManifestVerifier, VerifyError};
use tempfile::TempDir;
use tokio::net::TcpListener;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ResultSet date="2014-09-01 10:00:00">
  <Result id="1">
    <analysis_id>run123</analysis_id>
    <files>
      <file>
        <filename>reads.bam</filename>
        <checksum type="MD5">0f343b0931126a20f133d67c2b018a3b</checksum>
      </file>
      <file>
        <filename>reads.bam.bai</filename>
        <checksum type="MD5">5d41402abc4b2a76b9719d911017c592</checksum>
      </file>
    </files>
  </Result>
</ResultSet>
"#;

const METADATA_PATH: &str = "/cghub/metadata/analysisFull/run123";

async fn serve_manifest() -> SocketAddr {
    let app = Router::new()
        .route(METADATA_PATH, get(|| async { MANIFEST }))
        .route("/cghub/metadata/analysisFull/gone", get(|| async { StatusCode::NOT_FOUND }))
        .route("/cghub/metadata/analysisFull/broken", get(|| async { "<ResultSet><file>" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn verifier(base_dir: &Path) -> ManifestVerifier {
    ManifestVerifier::from_config(&VerifyConfig {
        base_dir: base_dir.to_path_buf(),
        patched_path: base_dir.join("patched.xml"),
        fetch_timeout_secs: 10,
        ..VerifyConfig::default()
    })
    .unwrap()
}

async fn stage(base_dir: &Path, files: &[&str]) {
    let folder = base_dir.join("run123");
    tokio::fs::create_dir_all(&folder).await.unwrap();
    for name in files {
        tokio::fs::write(folder.join(name), b"payload").await.unwrap();
    }
}

#[tokio::test]
async fn test_complete_result_set_passes() {
    let addr = serve_manifest().await;
    let temp_dir = TempDir::new().unwrap();
    stage(temp_dir.path(), &["reads.bam", "reads.bam.bai"]).await;

    let expected = digest_hex(&normalize(MANIFEST.as_bytes()));
    let url = format!("http://{}{}", addr, METADATA_PATH);
    let report = verifier(temp_dir.path())
        .verify(&url, Some(expected.as_str()))
        .await
        .unwrap();

    assert!(report.is_valid());
    assert_eq!(report.expected_files, 2);
    assert_eq!(report.folder, temp_dir.path().join("run123"));

    let patched = tokio::fs::read_to_string(temp_dir.path().join("patched.xml"))
        .await
        .unwrap();
    assert!(patched.contains("\n<ResultSet>\n"));
    assert!(!patched.contains("2014-09-01"));
    assert!(patched.ends_with("</ResultSet>"));
}

#[tokio::test]
async fn test_partial_download_fails() {
    let addr = serve_manifest().await;
    let temp_dir = TempDir::new().unwrap();
    stage(temp_dir.path(), &["reads.bam"]).await;

    let url = format!("http://{}{}", addr, METADATA_PATH);
    let report = verifier(temp_dir.path()).verify(&url, None).await.unwrap();

    assert!(!report.is_valid());
    assert_eq!(report.missing, vec!["reads.bam.bai"]);
    assert!(!temp_dir.path().join("patched.xml").exists());
}

#[tokio::test]
async fn test_stale_digest_fails() {
    let addr = serve_manifest().await;
    let temp_dir = TempDir::new().unwrap();
    stage(temp_dir.path(), &["reads.bam", "reads.bam.bai"]).await;

    let url = format!("http://{}{}", addr, METADATA_PATH);
    let report = verifier(temp_dir.path())
        .verify(&url, Some("d41d8cd98f00b204e9800998ecf8427e"))
        .await
        .unwrap();

    assert!(report.all_present());
    assert!(!report.digest_matches());
    assert!(!report.is_valid());
}

#[tokio::test]
async fn test_http_error_status_is_fetch_error() {
    let addr = serve_manifest().await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("http://{}/cghub/metadata/analysisFull/gone", addr);
    let result = verifier(temp_dir.path()).verify(&url, None).await;

    assert!(matches!(result, Err(VerifyError::Fetch { .. })));
}

#[tokio::test]
async fn test_truncated_manifest_is_rejected() {
    let addr = serve_manifest().await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("http://{}/cghub/metadata/analysisFull/broken", addr);
    let result = verifier(temp_dir.path()).verify(&url, None).await;

    assert!(matches!(result, Err(VerifyError::Parse(_) | VerifyError::Xml(_))));
}
