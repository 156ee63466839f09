use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whois::{config::WhoisConfig, console, handlers::Whois, sink::JsonLineSink};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // stdout carries outgoing messages, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whois=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting whois...");

    let config = WhoisConfig::from_env();
    tracing::info!(
        "Round timeout {}s, {} enabled / {} disabled groups",
        config.timeout.as_secs(),
        config.enable_groups.len(),
        config.disable_groups.len()
    );

    let whois = match Whois::from_config(config, Arc::new(JsonLineSink::stdout())) {
        Ok(whois) => Arc::new(whois),
        Err(e) => {
            tracing::error!("Failed to load answer key: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} answers available", whois.answer_key.len());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    if let Err(e) = console::run(whois.clone(), stdin).await {
        tracing::error!("Failed to read events: {}", e);
    }

    // Let running rounds reach their reveal before exiting
    while whois.games.active_rounds().await > 0 {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
