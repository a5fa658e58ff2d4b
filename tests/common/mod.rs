//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use jsondb_server::config::ServerConfig;
use jsondb_server::http::HttpServer;
use jsondb_server::jsondb::JsonDb;
use jsondb_server::lifecycle::Shutdown;
use jsondb_server::routing::RouteTable;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const FIXTURE: &str = r##"{
  "genres": ["comedy", "thriller", "drama"],
  "laptops": [
    {"id": 123, "brand": "dell"},
    {"id": 456, "brand": "lenovo"}
  ],
  "color": {"name": "red", "hex": "#ff0000"}
}"##;

/// A server running on an ephemeral port; stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub db_path: PathBuf,
    _dir: TempDir,
    shutdown: Shutdown,
}

impl TestServer {
    /// Serve `routes` as they are.
    pub async fn start(routes: RouteTable) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db.json");
        Self::spawn(routes, dir, db_path).await
    }

    /// Serve a document under `/api`. `None` leaves the file missing.
    pub async fn with_document(contents: Option<&str>, dry_run: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db.json");
        if let Some(contents) = contents {
            std::fs::write(&db_path, contents).unwrap();
        }

        let mut routes = RouteTable::new();
        routes
            .mount_jsondb("/api", JsonDb::from_file(&db_path).dry_run(dry_run))
            .unwrap();
        Self::spawn(routes, dir, db_path).await
    }

    async fn spawn(routes: RouteTable, dir: TempDir, db_path: PathBuf) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut config = ServerConfig::default();
        config.listener.bind_address = addr.to_string();
        config.jsondb.path = db_path.clone();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config, routes);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();

        Self {
            addr,
            client,
            db_path,
            _dir: dir,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Current file content.
    pub fn raw_document(&self) -> String {
        std::fs::read_to_string(&self.db_path).unwrap()
    }

    /// Current file content, parsed.
    pub fn document(&self) -> Value {
        serde_json::from_str(&self.raw_document()).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Status, content type and body of a response.
pub async fn read(response: reqwest::Response) -> (u16, String, String) {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.text().await.unwrap();
    (status, content_type, body)
}
