//! Per-request context handed to handlers, middlewares and computed
//! response values.

use axum::http::{HeaderMap, Method, Uri};
use serde_json::{Map, Value};

use crate::routing::Params;

/// Everything known about the request while the pipeline runs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Params captured by the route pattern.
    pub params: Params,
    /// Query string, last occurrence per name wins.
    pub query: Params,
    /// Pattern of the matched route.
    pub path_pattern: Option<String>,
    /// Part of the path consumed by the matched pattern.
    pub matched_path: Option<String>,
    /// Parsed JSON body, or the raw text when it is not JSON.
    pub body: Option<Value>,
    /// Route extras and values merged in by middlewares or handlers.
    pub props: Map<String, Value>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query = parse_query(uri.query());
        Self {
            method,
            uri,
            headers,
            params: Params::new(),
            query,
            path_pattern: None,
            matched_path: None,
            body: None,
            props: Map::new(),
        }
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path left over after the matched route prefix.
    pub fn remainder(&self) -> &str {
        let path = self.path();
        self.matched_path
            .as_deref()
            .and_then(|prefix| path.strip_prefix(prefix))
            .unwrap_or(path)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Shallow-merge `props`, later values win.
    pub fn merge_props(&mut self, props: Map<String, Value>) {
        self.props.extend(props);
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Parse a query string into a flat map.
pub fn parse_query(query: Option<&str>) -> Params {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(uri: &str) -> RequestContext {
        RequestContext::new(Method::GET, uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_query_last_occurrence_wins() {
        let ctx = context("/api/laptops?brand=dell&brand=lenovo&id=1");
        assert_eq!(ctx.query.get("brand").map(String::as_str), Some("lenovo"));
        assert_eq!(ctx.query.get("id").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_query_is_decoded() {
        let ctx = context("/search?q=hello%20world&tag=a+b");
        assert_eq!(ctx.query.get("q").map(String::as_str), Some("hello world"));
        assert_eq!(ctx.query.get("tag").map(String::as_str), Some("a b"));
    }

    #[test]
    fn test_remainder_after_prefix() {
        let mut ctx = context("/api/laptops/123?x=1");
        assert_eq!(ctx.remainder(), "/api/laptops/123");
        ctx.matched_path = Some("/api".into());
        assert_eq!(ctx.remainder(), "/laptops/123");
    }

    #[test]
    fn test_merge_props_overrides() {
        let mut ctx = context("/");
        ctx.props.insert("role".into(), json!("guest"));
        let mut extra = Map::new();
        extra.insert("role".into(), json!("admin"));
        extra.insert("isAdmin".into(), json!(true));
        ctx.merge_props(extra);
        assert_eq!(ctx.prop("role"), Some(&json!("admin")));
        assert_eq!(ctx.prop("isAdmin"), Some(&json!(true)));
    }
}
