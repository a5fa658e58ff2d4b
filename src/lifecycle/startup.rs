//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table from configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ServerConfig};
use crate::http::HttpServer;
use crate::jsondb::JsonDb;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{PatternError, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid route: {0}")]
    Route(#[from] PatternError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Route table serving the configured document under its base path.
pub fn build_routes(config: &ServerConfig) -> Result<RouteTable, PatternError> {
    let db = JsonDb::from_file(&config.jsondb.path).dry_run(config.jsondb.dry_run);
    let mut routes = RouteTable::new();
    routes.mount_jsondb(&config.jsondb.base_path, db)?;
    Ok(routes)
}

/// Start every subsystem and serve until shutdown.
pub async fn start(config: ServerConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let routes = build_routes(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        document = %config.jsondb.path.display(),
        dry_run = config.jsondb.dry_run,
        "Listening for connections"
    );

    HttpServer::new(config, routes)
        .run(listener, shutdown.subscribe())
        .await?;
    Ok(())
}
