//! Mandi marketplace server — REST catalog API plus negotiation chat.
//!
//! ```bash
//! # Run on default address 0.0.0.0:3000 with the built-in demo catalog
//! cargo run --bin mandi-server
//!
//! # Run on custom address with a catalog file
//! cargo run --bin mandi-server -- --bind 127.0.0.1:8080 --catalog catalog.toml
//!
//! # Or via environment variable
//! MANDI_ADDR=127.0.0.1:8080 cargo run --bin mandi-server
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mandi_server::api;
use mandi_server::catalog::CatalogStore;
use mandi_server::config::{ServerCliArgs, ServerConfig};
use mandi_server::session::ServerState;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = match config.catalog {
        Some(ref path) => match CatalogStore::load(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "failed to load catalog");
                std::process::exit(1);
            }
        },
        None => CatalogStore::with_demo_data(),
    };

    tracing::info!(
        addr = %config.bind_addr,
        products = catalog.len(),
        reply_delay_ms = config.reply_delay_ms,
        "starting mandi server"
    );

    let state = Arc::new(ServerState::with_reply_delay(
        catalog,
        Duration::from_millis(config.reply_delay_ms),
    ));

    match api::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "mandi server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
