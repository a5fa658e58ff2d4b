//! The mock-API route: CRUD verbs projected onto the JSON document.

use axum::http::StatusCode;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::http::context::RequestContext;
use crate::http::handler::{Handler, HandlerError, HandlerOutput};
use crate::http::response::content_type;
use crate::jsondb::path::segments;
use crate::jsondb::store::{self, Document, DocumentStore, FileStore};
use crate::jsondb::verbs::{self, Operation, Verb};
use crate::routing::{PatternError, RouteConfig, RouteTable};

#[derive(Debug, Clone)]
pub struct JsonDb {
    store: Arc<dyn DocumentStore>,
    dry_run: bool,
}

impl JsonDb {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Never write mutations back; responses are unchanged.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Serve one request against the document.
    pub async fn handle(&self, ctx: &RequestContext) -> Result<HandlerOutput, HandlerError> {
        let Some(verb) = Verb::from_method(&ctx.method) else {
            return Ok(status_only(StatusCode::METHOD_NOT_ALLOWED));
        };

        let Some(document) = store::load(self.store.as_ref()).await else {
            return Ok(HandlerOutput::new().status(StatusCode::NOT_FOUND));
        };

        let document = match document {
            Document::Json(value) => value,
            Document::Raw(text) if verb == Verb::Get => {
                return Ok(HandlerOutput::new()
                    .resp(text)
                    .status(StatusCode::OK)
                    .content_type(content_type::PLAIN_TEXT));
            }
            Document::Raw(_) => return Ok(status_only(StatusCode::BAD_REQUEST)),
        };

        let segments = segments(ctx.remainder());
        let op = Operation {
            verb,
            segments: &segments,
            body: ctx.body.as_ref(),
            query: &ctx.query,
        };
        let outcome = verbs::apply(document, &op);

        tracing::debug!(
            verb = ?verb,
            path = %ctx.remainder(),
            status = outcome.status.as_u16(),
            "Document operation applied"
        );

        if let Some(mutated) = &outcome.document {
            if self.dry_run {
                tracing::debug!("Dry run, document not written");
            } else {
                store::persist(self.store.as_ref(), mutated).await?;
            }
        }

        Ok(match outcome.body {
            Some(body) => HandlerOutput::new().resp(body).status(outcome.status),
            // Leave the body unset on 404 so the not-found fallback applies.
            None if outcome.status == StatusCode::NOT_FOUND => {
                HandlerOutput::new().status(outcome.status)
            }
            None => status_only(outcome.status),
        })
    }

    pub fn into_handler(self) -> Handler {
        Handler::from_async(move |ctx| {
            let db = self.clone();
            async move { db.handle(&ctx).await }
        })
    }

    /// Catch-all route under `base_path`.
    pub fn route(&self, base_path: &str) -> RouteConfig {
        RouteConfig::new(base_path)
            .handler(self.clone().into_handler())
            .root(true)
    }
}

/// Status with an explicitly empty body.
fn status_only(status: StatusCode) -> HandlerOutput {
    HandlerOutput::new().resp(Value::Null).status(status)
}

impl RouteTable {
    /// Register `db` for every method under `base_path`.
    pub fn mount_jsondb(&mut self, base_path: &str, db: JsonDb) -> Result<&mut Self, PatternError> {
        tracing::info!(base_path = %base_path, dry_run = db.is_dry_run(), "Mounting JSON document API");
        self.any(|| db.route(base_path))
    }
}
