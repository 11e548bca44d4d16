//! Push every file of a local directory into an S3 bucket.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use store_and_forward::upload::push_directory;
use store_and_forward::{logging, AppError, Config};

const USAGE: &str = "Usage: s3_push <directory> <bucketName> [<accessKey> <secretKey>]";

#[derive(Parser, Debug)]
#[command(name = "s3_push", version, about = "Upload a directory to S3 with multipart uploads")]
struct Args {
    /// Directory whose top-level files are uploaded
    directory: PathBuf,

    /// Destination bucket
    bucket: String,

    /// Access key; falls back to S3_ACCESS_KEY or the default AWS chain
    #[arg(requires = "secret_key")]
    access_key: Option<String>,

    secret_key: Option<String>,
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

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            eprintln!("s3_push: {}", e);
            return ExitCode::from(AppError::from(e).exit_code());
        }
    };

    config.storage.bucket = args.bucket;
    if let (Some(access_key), Some(secret_key)) = (args.access_key, args.secret_key) {
        config.storage.access_key = Some(access_key);
        config.storage.secret_key = Some(secret_key);
    }

    tracing::info!(bucket = %config.storage.bucket, "Connecting to S3 ...");

    match push_directory(&config, &args.directory).await {
        Ok(summary) => {
            println!(
                "Uploaded {} file(s), {} bytes in {} part(s)",
                summary.objects.len(),
                summary.total_bytes(),
                summary.total_parts()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, storage = e.is_storage(), "Push failed");
            eprintln!("Error interfacing with S3.");
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
