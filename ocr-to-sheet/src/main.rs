use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

mod auth;
mod config;
mod error;
mod extractor;
mod pipeline;
mod sheets;
mod source;
mod storage;
#[cfg(test)]
mod test_support;
mod vision;

use crate::auth::TokenProvider;
use crate::pipeline::{Outcome, Pipeline};
use crate::sheets::SheetsClient;
use crate::source::ImageReference;
use crate::storage::GcsClient;
use crate::vision::VisionConnector;

/// Extract text from a Cloud Storage image and store it in a new Google Sheet
#[derive(Parser)]
#[command(name = "ocr-to-sheet")]
#[command(version)]
struct Cli {
    /// Image to process as gs://bucket/key. Defaults to the configured source.
    image_uri: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging();

    info!("Starting ocr-to-sheet v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config()?;

    let image = match &cli.image_uri {
        Some(uri) => ImageReference::parse_uri(uri)?,
        None => ImageReference::from_config(&config.source)?,
    };
    info!(image = %image, "Processing image");

    let tokens = Arc::new(TokenProvider::from_environment(config.auth.clone())?);

    let store = GcsClient::new(&config.storage, &config.auth.storage_scope, tokens.clone())?;
    let connector =
        VisionConnector::new(config.vision.clone(), &config.auth.vision_scope, tokens.clone());
    let sheets = SheetsClient::new(&config.sheets, &config.auth.sheets_scope, tokens)?;

    let mut pipeline = Pipeline::new(config, store, connector, sheets);
    let outcome = pipeline
        .run(&image)
        .await
        .inspect_err(|e| error!(error = %e, state = ?pipeline.state(), "Run failed"))?;

    match &outcome {
        Outcome::Published(record) => info!(
            spreadsheet_id = %record.spreadsheet_id,
            title = %record.title,
            "Run complete"
        ),
        Outcome::NoText {
            rejection: Some(reason),
        } => info!(reason = %reason, "Run complete without text"),
        Outcome::NoText { rejection: None } => info!("Run complete without text"),
    }
    println!("{}", outcome);

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format().with_target(true).compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate.
    // Logs go to stderr; stdout carries only the run result.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ocr_to_sheet=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
