//! Confirm a downloaded result set matches its remote manifest.
//!
//! Exit status is 0 when every listed file is present (and the normalized
//! manifest digest matches, when one is given), 1 otherwise.

use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use store_and_forward::manifest::ManifestVerifier;
use store_and_forward::{logging, AppError, Config};

const USAGE: &str = "Usage: download_check <metadataURL> [expectedDigestHex]";

#[derive(Parser, Debug)]
#[command(name = "download_check", version, about = "Verify a downloaded result set against its manifest")]
struct Args {
    /// Metadata URL of the result set, e.g. https://host/cghub/metadata/analysisFull/<id>
    url: String,

    /// Expected MD5 (lowercase hex) of the normalized manifest
    digest: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    dotenvy::dotenv().ok();
    logging::init();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("download_check: {:#}", e);
            let code = e.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = Config::from_env()
        .map_err(AppError::from)
        .context("Failed to load configuration")?;

    let verifier = ManifestVerifier::from_config(&config.verify).map_err(AppError::from)?;
    let report = verifier
        .verify(&args.url, args.digest.as_deref())
        .await
        .map_err(AppError::from)?;

    for filename in &report.missing {
        println!("missing: {}", report.folder.join(filename).display());
    }
    if let Some(digest) = report.digest.as_ref().filter(|d| !d.matches()) {
        println!(
            "digest mismatch: expected {} got {}",
            digest.expected, digest.actual
        );
    }

    Ok(report.is_valid())
}
