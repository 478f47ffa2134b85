use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use contact_form::logging;
use contact_form::relay::config::RelayConfig;
use contact_form::relay::server;
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    if let Err(e) = logging::init() {
        eprintln!("[Relay] Logging unavailable: {}", e);
    }

    let config = RelayConfig::parse();
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;
    let relay = Arc::new(config.build_relay(client));

    let (listener, port) = server::bind(&config.host, config.port).await?;
    tracing::info!(
        contacts = %config.contacts_url,
        tickets = %config.tickets_url,
        "Relay listening on http://{}:{}",
        config.host,
        port
    );

    server::serve(listener, relay)
        .await
        .context("relay server stopped")
}
