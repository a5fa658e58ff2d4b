//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, request ID)
//!     → pipeline.rs (match → body → middlewares → handler → fallback → force)
//!     → context.rs (per-request state handed to handlers)
//!     → handler.rs / middleware.rs (user-registered behaviour)
//!     → response.rs (content type, serialized body)
//!     → Send to client
//! ```

pub mod context;
pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use context::RequestContext;
pub use handler::{Handler, HandlerError, HandlerOutput};
pub use middleware::{middleware, ErrorResponse, Middleware, MiddlewareError};
pub use pipeline::{BodyReader, LimitedBodyReader, Pipeline, PipelineError};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{content_type, Responder, ResponseValue};
pub use server::HttpServer;
