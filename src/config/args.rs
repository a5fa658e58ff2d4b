//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "jsondb-server")]
#[command(about = "Mock REST API server backed by a JSON file", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// JSON document file.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// URL prefix of the document API.
    #[arg(long)]
    pub base_path: Option<String>,

    /// Answer mutations without writing the document.
    #[arg(long)]
    pub dry: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overwrite `config` with every flag that was given.
    pub fn apply(&self, config: &mut ServerConfig) {
        if self.host.is_some() || self.port.is_some() {
            let (current_host, current_port) = split_address(&config.listener.bind_address);
            let host = self.host.as_deref().unwrap_or(current_host);
            let port = self
                .port
                .map(|p| p.to_string())
                .unwrap_or_else(|| current_port.to_string());
            config.listener.bind_address = format!("{host}:{port}");
        }
        if let Some(db) = &self.db {
            config.jsondb.path = db.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.jsondb.base_path = base_path.clone();
        }
        if self.dry {
            config.jsondb.dry_run = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

fn split_address(address: &str) -> (&str, &str) {
    address.rsplit_once(':').unwrap_or((address, "8000"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_keeps_config() {
        let cli = Cli::parse_from(["jsondb-server"]);
        let mut config = ServerConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::parse_from([
            "jsondb-server",
            "--host",
            "127.0.0.1",
            "--base-path",
            "/mock",
            "--dry",
            "--log-level",
            "debug",
        ]);
        let mut config = ServerConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.jsondb.base_path, "/mock");
        assert!(config.jsondb.dry_run);
        assert_eq!(config.observability.log_level, "debug");
    }
}
