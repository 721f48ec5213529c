/// Miivvy shortcut server
///
/// Main entry point. Loads `.env`, builds configuration from the environment and
/// starts the HTTP server.

use miivvy_shortcuts::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Shortcut generation and delivery at /api/shortcuts/*
/// - App usage event webhook at /api/webhook
/// - Signed object downloads at /objects/*
/// - Health checks at / and /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies
    dotenvy::dotenv().ok();

    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
