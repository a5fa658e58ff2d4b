//! Middleware chains in front of a responder.
//!
//! # Responsibilities
//! - Run middlewares in order, each receiving the context produced by the
//!   previous one
//! - Turn a rejection into a handler answering with its status/body/type
//! - Turn any other failure into an empty 500
//!
//! # Design Decisions
//! - Short-circuit is an explicit `Err(MiddlewareError::Reject(..))`,
//!   never a panic

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::handler::{Handler, HandlerOutput};

/// Response a middleware short-circuits with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorResponse {
    pub status: Option<StatusCode>,
    pub resp: Option<Value>,
    pub content_type: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn resp(mut self, resp: impl Into<Value>) -> Self {
        self.resp = Some(resp.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// Stop the chain and answer with this response.
    #[error("request rejected: {0:?}")]
    Reject(ErrorResponse),

    /// Unexpected failure.
    #[error("middleware failed: {0}")]
    Failed(String),
}

pub type MiddlewareResult = Result<RequestContext, MiddlewareError>;

pub type Middleware = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, MiddlewareResult> + Send + Sync>;

/// Wrap an async function as a middleware.
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// A middleware chain paired with the responder it guards.
pub struct Composed {
    middlewares: Vec<Middleware>,
    responder: Handler,
}

impl Composed {
    pub fn new(middlewares: Vec<Middleware>, responder: Handler) -> Self {
        Self {
            middlewares,
            responder,
        }
    }

    /// Run the chain.
    pub async fn run(&self, mut ctx: RequestContext) -> MiddlewareResult {
        for middleware in &self.middlewares {
            ctx = middleware(ctx).await?;
        }
        Ok(ctx)
    }

    /// Run the chain and pick the handler to invoke next, along with the
    /// context it should see.
    pub async fn resolve(&self, ctx: RequestContext) -> (RequestContext, Handler) {
        let original = ctx.clone();
        match self.run(ctx).await {
            Ok(ctx) => (ctx, self.responder.clone()),
            Err(err) => (original, rejection_handler(err)),
        }
    }
}

impl fmt::Debug for Composed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composed")
            .field("middlewares", &self.middlewares.len())
            .field("responder", &self.responder)
            .finish()
    }
}

fn rejection_handler(err: MiddlewareError) -> Handler {
    match err {
        MiddlewareError::Reject(rejection)
            if rejection.status.is_some() || rejection.resp.is_some() =>
        {
            tracing::debug!(status = ?rejection.status, "Middleware rejected request");
            let mut output = HandlerOutput::new().resp(rejection.resp.unwrap_or(Value::Null));
            output.status = rejection.status;
            output.content_type = rejection.content_type;
            Handler::value(output)
        }
        other => {
            tracing::error!(error = %other, "Middleware failed");
            Handler::value(
                HandlerOutput::new()
                    .resp(Value::Null)
                    .status(StatusCode::INTERNAL_SERVER_ERROR),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseValue;
    use axum::http::{HeaderMap, Method};
    use serde_json::json;

    fn context() -> RequestContext {
        RequestContext::new(Method::GET, "/admin".parse().unwrap(), HeaderMap::new())
    }

    fn responder() -> Handler {
        Handler::sync(|ctx| {
            Ok(HandlerOutput::new().resp(json!({ "isAdmin": ctx.prop("isAdmin") })))
        })
    }

    async fn literal(output: &HandlerOutput) -> Option<Value> {
        match &output.resp {
            Some(ResponseValue::Literal(v)) => Some(v.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_chain_passes_context_along() {
        let composed = Composed::new(
            vec![
                middleware(|mut ctx| async move {
                    ctx.props.insert("isAdmin".into(), json!(false));
                    Ok(ctx)
                }),
                middleware(|mut ctx| async move {
                    ctx.props.insert("isAdmin".into(), json!(true));
                    Ok(ctx)
                }),
            ],
            responder(),
        );

        let (ctx, handler) = composed.resolve(context()).await;
        assert_eq!(ctx.prop("isAdmin"), Some(&json!(true)));
        let output = handler.invoke(&ctx).await.unwrap();
        let value = output.resp.unwrap().force(&ctx).await;
        assert_eq!(value, json!({"isAdmin": true}));
    }

    #[tokio::test]
    async fn test_rejection_short_circuits() {
        let composed = Composed::new(
            vec![middleware(|_| async {
                Err(MiddlewareError::Reject(
                    ErrorResponse::new(StatusCode::UNAUTHORIZED)
                        .resp("go away")
                        .content_type("text/html"),
                ))
            })],
            responder(),
        );

        let (ctx, handler) = composed.resolve(context()).await;
        let output = handler.invoke(&ctx).await.unwrap();
        assert_eq!(output.status, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(output.content_type.as_deref(), Some("text/html"));
        assert_eq!(literal(&output).await, Some(json!("go away")));
    }

    #[tokio::test]
    async fn test_empty_rejection_is_server_error() {
        let composed = Composed::new(
            vec![middleware(|_| async {
                Err(MiddlewareError::Reject(ErrorResponse::default()))
            })],
            responder(),
        );
        let (ctx, handler) = composed.resolve(context()).await;
        let output = handler.invoke(&ctx).await.unwrap();
        assert_eq!(output.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(literal(&output).await, Some(Value::Null));
    }

    #[tokio::test]
    async fn test_failure_is_server_error() {
        let composed = Composed::new(
            vec![middleware(|_| async { Err(MiddlewareError::Failed("db down".into())) })],
            responder(),
        );
        let (ctx, handler) = composed.resolve(context()).await;
        let output = handler.invoke(&ctx).await.unwrap();
        assert_eq!(output.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
