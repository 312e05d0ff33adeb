//! # lumina-server
//!
//! HTTP front end for the Lumina venue and artist directory.
//!
//! This binary provides:
//! - **REST API** (axum) to browse, search and map listings
//! - owner-only create / edit / delete, with the acting user asserted by an
//!   upstream identity layer through `x-actor-*` headers
//! - photo uploads re-encoded to bounded inline JPEGs
//! - a choice of local JSON files or SQLite tables for storage

mod api;
mod config;
mod error;
mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::{ServerConfig, StoreBackend};
use crate::state::Directories;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lumina_server=debug")),
        )
        .init();

    info!("Starting Lumina directory server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open storage
    // -----------------------------------------------------------------------
    if config.import_local_data {
        if config.store_backend == StoreBackend::Table {
            state::import_local_data(&config)?;
        } else {
            tracing::warn!("IMPORT_LOCAL_DATA only applies to the table backend, ignoring");
        }
    }

    let directories = Directories::open(&config)?;

    let http_addr = config.http_addr;
    let app_state = AppState {
        directories,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
