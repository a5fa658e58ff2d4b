//! Request-processing pipeline.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → match     (route table: pattern + method, params, definition)
//!     → body      (read, UTF-8, JSON or raw text)
//!     → resolve   (middleware chain picks the handler)
//!     → invoke    (handler output merged into the exchange)
//!     → fallback  (not-found definition when nothing answered)
//!     → force     (computed response values evaluated)
//!     → Responder (status, serialized body, content type)
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in order, each one async
//! - Handler errors propagate as `PipelineError`; the server turns them
//!   into an empty 500

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::handler::{Handler, HandlerError};
use crate::http::response::{Responder, ResponseValue};
use crate::routing::RouteTable;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Reads a request body into memory.
#[async_trait]
pub trait BodyReader: Send + Sync {
    async fn read(&self, body: Body) -> Result<Bytes, PipelineError>;
}

/// Body reader refusing bodies larger than `limit` bytes.
#[derive(Debug, Clone, Copy)]
pub struct LimitedBodyReader {
    limit: usize,
}

impl LimitedBodyReader {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl BodyReader for LimitedBodyReader {
    async fn read(&self, body: Body) -> Result<Bytes, PipelineError> {
        axum::body::to_bytes(body, self.limit)
            .await
            .map_err(|e| PipelineError::Body(e.to_string()))
    }
}

/// State carried between stages.
struct Exchange {
    ctx: RequestContext,
    handler: Option<Handler>,
    resp: Option<ResponseValue>,
    status: Option<StatusCode>,
    content_type: Option<String>,
}

pub struct Pipeline {
    routes: Arc<RouteTable>,
    body_reader: Option<Arc<dyn BodyReader>>,
}

impl Pipeline {
    /// Pipeline without a body reader: request bodies are ignored.
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self {
            routes,
            body_reader: None,
        }
    }

    pub fn with_body_reader(mut self, reader: Arc<dyn BodyReader>) -> Self {
        self.body_reader = Some(reader);
        self
    }

    /// Run every stage for one request.
    pub async fn process(&self, request: Request<Body>) -> Result<Responder, PipelineError> {
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::new(parts.method, parts.uri, parts.headers);

        let exchange = self.match_route(ctx);
        let exchange = self.read_body(exchange, body).await?;
        let exchange = resolve_middlewares(exchange).await;
        let exchange = invoke_handler(exchange).await?;
        let exchange = self.apply_not_found(exchange);
        let (value, exchange) = force_response(exchange).await;

        Ok(Responder::build(value, exchange.status, exchange.content_type))
    }

    fn match_route(&self, mut ctx: RequestContext) -> Exchange {
        let Some(matched) = self.routes.match_route(&ctx.method, ctx.uri.path()) else {
            tracing::debug!(method = %ctx.method, path = %ctx.path(), "No route matched");
            return Exchange {
                ctx,
                handler: None,
                resp: None,
                status: None,
                content_type: None,
            };
        };

        let definition = matched.definition;
        ctx.params = matched.matched.params;
        ctx.matched_path = Some(matched.matched.path);
        ctx.path_pattern = Some(matched.pattern.to_string());
        ctx.merge_props(definition.props.clone());

        tracing::debug!(
            method = %ctx.method,
            path = %ctx.path(),
            pattern = %matched.pattern,
            "Route matched"
        );

        Exchange {
            ctx,
            handler: definition.handler.clone(),
            resp: definition.resp.clone(),
            status: definition.status,
            content_type: definition.content_type.clone(),
        }
    }

    async fn read_body(&self, mut exchange: Exchange, body: Body) -> Result<Exchange, PipelineError> {
        let Some(reader) = &self.body_reader else {
            return Ok(exchange);
        };
        let bytes = reader.read(body).await?;
        exchange.ctx.body = parse_body(&bytes);
        Ok(exchange)
    }

    fn apply_not_found(&self, mut exchange: Exchange) -> Exchange {
        if exchange.resp.is_some() {
            return exchange;
        }
        if let Some(fallback) = self.routes.not_found_definition() {
            exchange.resp = fallback.resp.clone();
            exchange.status = Some(StatusCode::NOT_FOUND);
            exchange.content_type = fallback.content_type.clone();
        }
        exchange
    }
}

/// JSON when it parses, the raw text otherwise; empty is no body.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned())))
}

async fn resolve_middlewares(mut exchange: Exchange) -> Exchange {
    if let Some(Handler::Composed(composed)) = &exchange.handler {
        let composed = composed.clone();
        let (ctx, handler) = composed.resolve(exchange.ctx).await;
        exchange.ctx = ctx;
        exchange.handler = Some(handler);
    }
    exchange
}

async fn invoke_handler(mut exchange: Exchange) -> Result<Exchange, PipelineError> {
    let Some(handler) = exchange.handler.take() else {
        return Ok(exchange);
    };
    let output = handler.invoke(&exchange.ctx).await?;

    if output.resp.is_some() {
        exchange.resp = output.resp;
    }
    if output.status.is_some() {
        exchange.status = output.status;
    }
    if output.content_type.is_some() {
        exchange.content_type = output.content_type;
    }
    exchange.ctx.merge_props(output.props);
    exchange.handler = Some(handler);
    Ok(exchange)
}

async fn force_response(mut exchange: Exchange) -> (Option<Value>, Exchange) {
    let value = match &exchange.resp {
        Some(resp) => Some(resp.force(&exchange.ctx).await),
        None => None,
    };
    let value = value.filter(|v| !v.is_null());
    if value.is_none() && exchange.status.is_none() {
        exchange.status = Some(StatusCode::NOT_FOUND);
    }
    (value, exchange)
}
