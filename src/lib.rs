//! Mock REST API server backed by a single JSON file.
//!
//! Requests are matched against an ordered route table and run through an
//! async pipeline. The catch-all document route maps GET/POST/PUT/PATCH/DELETE
//! onto paths inside the JSON document.

// Core subsystems
pub mod config;
pub mod http;
pub mod jsondb;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use jsondb::JsonDb;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
