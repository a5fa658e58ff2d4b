//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single fallback into the pipeline
//! - Wire up middleware (request ID, tracing, timeout, body limit, panics)
//! - Bind server to listener and drain on shutdown
//! - Turn pipeline failures into empty 500 responses
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::pipeline::{LimitedBodyReader, Pipeline, PipelineError};
use crate::http::request::{request_id, UuidRequestId};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the route table.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `routes`.
    pub fn new(config: ServerConfig, routes: RouteTable) -> Self {
        let body_reader = Arc::new(LimitedBodyReader::new(config.limits.max_body_size));
        let pipeline = Pipeline::new(Arc::new(routes)).with_body_reader(body_reader);
        let state = AppState {
            pipeline: Arc::new(pipeline),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until Ctrl+C, SIGTERM or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.jsondb.base_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    },
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Every request lands here and runs through the pipeline.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Processing request"
    );

    let response = match state.pipeline.process(request).await {
        Ok(responder) => responder.into_response(),
        Err(PipelineError::Body(e)) => {
            tracing::warn!(request_id = %request_id, error = %e, "Unreadable request body");
            StatusCode::PAYLOAD_TOO_LARGE.into_response()
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Request failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    let status = response.status().as_u16();
    metrics::record_request(method.as_str(), status, start_time);
    tracing::debug!(request_id = %request_id, status, "Request completed");
    response
}

/// Empty 500 for a panicking handler.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
