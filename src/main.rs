//! jsondb-server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ pipeline ──▶ route table
//!                     (layers)        (stages)        │
//!                                                     ▼
//!     Client Response                            handler / jsondb
//!     ◀────────────── responder ◀─────────────── (db.json on disk)
//! ```

use clap::Parser;

use jsondb_server::config::{resolve_config, Cli};
use jsondb_server::lifecycle::{self, Shutdown};
use jsondb_server::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init(&config.observability.log_level);

    tracing::info!("jsondb-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.jsondb.base_path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    lifecycle::start(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
