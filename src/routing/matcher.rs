//! Route matching logic.
//!
//! # Responsibilities
//! - Map request methods onto registration keys (case-insensitive)
//! - Match a request path against one route entry
//! - Fall back from the concrete method to the `any` entry
//!
//! # Design Decisions
//! - Method lookup before path matching: entries without a usable method
//!   are skipped without running the pattern
//! - Root routes match by prefix, everything else matches the whole path

use axum::http::Method;
use std::fmt;

use crate::routing::pattern::{PathPattern, PatternMatch};
use crate::routing::router::RouteDefinition;

/// Method slot a route definition is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKey {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Any,
}

impl MethodKey {
    /// Map a request method; methods without a registration slot yield `None`.
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str().to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One path pattern with its per-method definitions.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub(crate) pattern: PathPattern,
    pub(crate) methods: Vec<(MethodKey, RouteDefinition)>,
}

impl RouteEntry {
    pub(crate) fn new(pattern: PathPattern) -> Self {
        Self {
            pattern,
            methods: Vec::new(),
        }
    }

    /// Insert or replace the definition for `key`, keeping its position.
    pub(crate) fn set(&mut self, key: MethodKey, definition: RouteDefinition) {
        match self.methods.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = definition,
            None => self.methods.push((key, definition)),
        }
    }

    /// Definition for the request method, falling back to `any`.
    pub fn definition_for(&self, method: &Method) -> Option<&RouteDefinition> {
        let wanted = MethodKey::from_method(method);
        wanted
            .and_then(|key| self.lookup(key))
            .or_else(|| self.lookup(MethodKey::Any))
    }

    fn lookup(&self, key: MethodKey) -> Option<&RouteDefinition> {
        self.methods
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, definition)| definition)
    }

    /// Try this entry against a request.
    pub fn try_match(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let definition = self.definition_for(method)?;
        let matched = if definition.root {
            self.pattern.matches_prefix(path)?
        } else {
            self.pattern.matches(path)?
        };
        Some(RouteMatch {
            pattern: self.pattern.as_str(),
            matched,
            definition,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// The winning entry for a request.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// Pattern as registered.
    pub pattern: &'a str,
    /// Consumed path and captured params.
    pub matched: PatternMatch,
    /// Definition registered for the method (or `any`).
    pub definition: &'a RouteDefinition,
}
