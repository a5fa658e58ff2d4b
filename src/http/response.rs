//! Response values and the final responder.
//!
//! # Responsibilities
//! - Represent a response as a literal, a computed or an async computed value
//! - Force any of those with the request context
//! - Pick the content type and serialize the body
//!
//! # Design Decisions
//! - Explicit content type wins, then JSON for objects/arrays, then plain text
//! - Strings go out verbatim, other scalars as their JSON text
//! - JSON `null` counts as no body

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::http::context::RequestContext;

/// Content-type values used by the server.
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const PLAIN_TEXT: &str = "text/plain";
    pub const HTML: &str = "text/html";
}

type ComputeFn = Arc<dyn Fn(&RequestContext) -> Value + Send + Sync>;
type AsyncComputeFn = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Value> + Send + Sync>;

/// A response body that may still need computing.
#[derive(Clone)]
pub enum ResponseValue {
    Literal(Value),
    Computed(ComputeFn),
    AsyncComputed(AsyncComputeFn),
}

impl ResponseValue {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Value + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    pub fn async_computed<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        Self::AsyncComputed(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    /// Produce the value, running the computation if there is one.
    pub async fn force(&self, ctx: &RequestContext) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(compute) => compute(ctx),
            Self::AsyncComputed(compute) => compute(ctx.clone()).await,
        }
    }
}

impl fmt::Debug for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::AsyncComputed(_) => f.write_str("AsyncComputed(..)"),
        }
    }
}

impl From<Value> for ResponseValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

/// Transmittable response: status, serialized body, content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responder {
    pub status: Option<StatusCode>,
    pub body: String,
    pub content_type: String,
}

impl Responder {
    /// Serialize a resolved value.
    pub fn build(value: Option<Value>, status: Option<StatusCode>, explicit_type: Option<String>) -> Self {
        let value = value.filter(|v| !v.is_null());
        let structured = matches!(value, Some(Value::Object(_) | Value::Array(_)));
        let content_type = explicit_type.unwrap_or_else(|| {
            let default = if structured {
                content_type::JSON
            } else {
                content_type::PLAIN_TEXT
            };
            default.to_string()
        });
        let body = match value {
            None => String::new(),
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
        };

        Self {
            status,
            body,
            content_type,
        }
    }

    /// Status sent on the wire.
    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}

impl IntoResponse for Responder {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(content_type::PLAIN_TEXT));
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        response
    }
}
