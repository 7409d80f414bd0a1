//! shopscrape entry point.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopscrape::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // The run log mirrors the console into logs/scrape.log
    std::fs::create_dir_all("logs")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("logs/scrape.log")?;

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "shopscrape=debug"
    } else {
        "shopscrape=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    cli::run().await
}
