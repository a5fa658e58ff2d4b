//! Route table and registration.
//!
//! # Responsibilities
//! - Store route definitions in registration order
//! - Look up the first matching route for a request
//! - Hold the not-found fallback definition
//!
//! # Design Decisions
//! - Built before the server starts, shared read-only behind `Arc`
//! - First match wins: registration order is the priority
//! - Re-registering a pattern + method replaces the definition in place

use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::http::handler::Handler;
use crate::http::response::ResponseValue;
use crate::routing::matcher::{MethodKey, RouteEntry, RouteMatch};
use crate::routing::pattern::{PathPattern, PatternError};

/// What a route answers with.
#[derive(Debug, Clone, Default)]
pub struct RouteDefinition {
    /// Static or computed response value.
    pub resp: Option<ResponseValue>,
    /// Handler invoked with the request context.
    pub handler: Option<Handler>,
    /// Status to answer with.
    pub status: Option<StatusCode>,
    /// Content-type override.
    pub content_type: Option<String>,
    /// Extra properties forwarded into the request context.
    pub props: Map<String, Value>,
    /// Match the pattern as a path prefix.
    pub root: bool,
}

impl RouteDefinition {
    pub fn resp(mut self, resp: impl Into<ResponseValue>) -> Self {
        self.resp = Some(resp.into());
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
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

    pub fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    /// The response value when it is a plain literal.
    pub fn literal(&self) -> Option<&Value> {
        match &self.resp {
            Some(ResponseValue::Literal(value)) => Some(value),
            _ => None,
        }
    }
}

/// A definition paired with the path it is registered under.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub path: String,
    pub definition: RouteDefinition,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            definition: RouteDefinition::default(),
        }
    }

    pub fn resp(mut self, resp: impl Into<ResponseValue>) -> Self {
        self.definition = self.definition.resp(resp);
        self
    }

    /// Register a handler (the `use` slot).
    pub fn handler(mut self, handler: Handler) -> Self {
        self.definition = self.definition.handler(handler);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.definition = self.definition.status(status);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.definition = self.definition.content_type(content_type);
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.definition = self.definition.prop(key, value);
        self
    }

    pub fn root(mut self, root: bool) -> Self {
        self.definition = self.definition.root(root);
        self
    }
}

/// Ordered routing table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    not_found: Option<RouteDefinition>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the definition produced by `configure` under `method`.
    pub fn register<F>(&mut self, method: MethodKey, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        let RouteConfig { path, definition } = configure();
        let position = self.entries.iter().position(|e| e.pattern() == path);
        let entry = match position {
            Some(index) => &mut self.entries[index],
            None => {
                let pattern = PathPattern::parse(&path)?;
                self.entries.push(RouteEntry::new(pattern));
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        };

        tracing::debug!(path = %path, method = %method, "Route registered");
        entry.set(method, definition);
        Ok(self)
    }

    pub fn get<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Get, configure)
    }

    pub fn post<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Post, configure)
    }

    pub fn put<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Put, configure)
    }

    pub fn patch<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Patch, configure)
    }

    pub fn delete<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Delete, configure)
    }

    pub fn any<F>(&mut self, configure: F) -> Result<&mut Self, PatternError>
    where
        F: FnOnce() -> RouteConfig,
    {
        self.register(MethodKey::Any, configure)
    }

    /// Set the fallback answered when nothing else produced a response.
    /// A later call replaces the earlier one.
    pub fn not_found<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce() -> RouteDefinition,
    {
        self.not_found = Some(configure());
        self
    }

    pub fn not_found_definition(&self) -> Option<&RouteDefinition> {
        self.not_found.as_ref()
    }

    /// First entry, in registration order, matching path and method.
    pub fn match_route<'a>(&'a self, method: &Method, path: &str) -> Option<RouteMatch<'a>> {
        self.entries
            .iter()
            .find_map(|entry| entry.try_match(method, path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_registered_match_wins() {
        let mut table = RouteTable::new();
        table
            .get(|| RouteConfig::new("/items/:id").resp("by id"))
            .unwrap()
            .get(|| RouteConfig::new("/items/special").resp("special"))
            .unwrap();

        let matched = table.match_route(&Method::GET, "/items/special").unwrap();
        assert_eq!(matched.pattern, "/items/:id");
        assert_eq!(matched.definition.literal(), Some(&json!("by id")));
        assert_eq!(matched.matched.params.get("id").map(String::as_str), Some("special"));
    }

    #[test]
    fn test_pattern_without_method_falls_through() {
        let mut table = RouteTable::new();
        table
            .post(|| RouteConfig::new("/items/:id").resp("post"))
            .unwrap()
            .get(|| RouteConfig::new("/items/:key").resp("get"))
            .unwrap();

        let matched = table.match_route(&Method::GET, "/items/1").unwrap();
        assert_eq!(matched.pattern, "/items/:key");
    }

    #[test]
    fn test_multiple_methods_share_a_path() {
        let mut table = RouteTable::new();
        table
            .get(|| RouteConfig::new("/path").resp("ping"))
            .unwrap()
            .delete(|| RouteConfig::new("/path").resp("pong"))
            .unwrap();

        assert_eq!(table.len(), 1);
        let get = table.match_route(&Method::GET, "/path").unwrap();
        let delete = table.match_route(&Method::DELETE, "/path").unwrap();
        assert_eq!(get.definition.literal(), Some(&json!("ping")));
        assert_eq!(delete.definition.literal(), Some(&json!("pong")));
    }

    #[test]
    fn test_any_route_serves_every_method() {
        let mut table = RouteTable::new();
        table.any(|| RouteConfig::new("/any").resp("any")).unwrap();
        for method in [Method::GET, Method::POST, Method::PUT, Method::OPTIONS] {
            assert!(table.match_route(&method, "/any").is_some(), "{method}");
        }
    }

    #[test]
    fn test_not_found_is_replaced() {
        let mut table = RouteTable::new();
        table
            .not_found(|| RouteDefinition::default().resp("first"))
            .not_found(|| {
                RouteDefinition::default()
                    .resp("<p>Nothing here...</p>")
                    .content_type("text/html")
            });
        let fallback = table.not_found_definition().unwrap();
        assert_eq!(fallback.literal(), Some(&json!("<p>Nothing here...</p>")));
        assert_eq!(fallback.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut table = RouteTable::new();
        let result = table.get(|| RouteConfig::new("no-slash"));
        assert!(result.is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_extra_props_are_kept() {
        let mut table = RouteTable::new();
        table
            .post(|| RouteConfig::new("/post/:id").prop("something", "else"))
            .unwrap();
        let matched = table.match_route(&Method::POST, "/post/1").unwrap();
        assert_eq!(matched.definition.props.get("something"), Some(&json!("else")));
    }
}
