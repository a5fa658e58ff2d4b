//! Route handlers.
//!
//! A handler is a value, a synchronous function or an asynchronous function
//! of the request context. All three are invoked through [`Handler::invoke`].
//! A composed handler runs a middleware chain before its responder.

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::middleware::{Composed, Middleware};
use crate::http::response::ResponseValue;
use crate::jsondb::store::StoreError;

/// Errors a handler can raise. Unhandled, they become a 500 response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("handler failed: {0}")]
    Failed(String),
}

/// What a handler contributes to the response.
#[derive(Debug, Clone, Default)]
pub struct HandlerOutput {
    pub resp: Option<ResponseValue>,
    pub status: Option<StatusCode>,
    pub content_type: Option<String>,
    /// Merged into the request context.
    pub props: Map<String, Value>,
}

impl HandlerOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resp(mut self, resp: impl Into<ResponseValue>) -> Self {
        self.resp = Some(resp.into());
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

pub type HandlerResult = Result<HandlerOutput, HandlerError>;

type SyncFn = Arc<dyn Fn(&RequestContext) -> HandlerResult + Send + Sync>;
type AsyncFn = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

#[derive(Clone)]
pub enum Handler {
    Value(HandlerOutput),
    Sync(SyncFn),
    Async(AsyncFn),
    Composed(Arc<Composed>),
}

impl Handler {
    pub fn value(output: HandlerOutput) -> Self {
        Self::Value(output)
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Async(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    /// Run `middlewares` in order, then `responder`.
    pub fn with_middlewares(middlewares: Vec<Middleware>, responder: Handler) -> Self {
        Self::Composed(Arc::new(Composed::new(middlewares, responder)))
    }

    pub fn invoke<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            match self {
                Self::Value(output) => Ok(output.clone()),
                Self::Sync(f) => f(ctx),
                Self::Async(f) => f(ctx.clone()).await,
                Self::Composed(composed) => {
                    let (ctx, responder) = composed.resolve(ctx.clone()).await;
                    responder.invoke(&ctx).await
                }
            }
        })
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(output) => f.debug_tuple("Value").field(output).finish(),
            Self::Sync(_) => f.write_str("Sync(..)"),
            Self::Async(_) => f.write_str("Async(..)"),
            Self::Composed(composed) => f.debug_tuple("Composed").field(composed).finish(),
        }
    }
}
