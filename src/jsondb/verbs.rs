//! HTTP verbs applied to a JSON document.
//!
//! # Responsibilities
//! - Read, merge-create, replace, partially merge and delete values
//!   addressed by request segments
//! - Decide the status and body of each outcome
//! - Hand back the mutated document when it should be persisted
//!
//! # Design Decisions
//! - Pure: no I/O here, the caller loads and persists
//! - Successful POST/PATCH/DELETE answer with the whole document
//! - Failures answer with the emptied shape of the addressed value, when
//!   there is one

use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::jsondb::filter;
use crate::jsondb::path::{resolve, resolve_direct, Accessor, BY_INDEX};
use crate::routing::Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// HEAD reads like GET; unsupported methods yield `None`.
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str().to_ascii_uppercase().as_str() {
            "GET" | "HEAD" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// One verb against one address.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub verb: Verb,
    pub segments: &'a [String],
    pub body: Option<&'a Value>,
    pub query: &'a Params,
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: StatusCode,
    /// Response body; `None` sends nothing.
    pub body: Option<Value>,
    /// Mutated document to persist.
    pub document: Option<Value>,
}

enum Reply {
    /// Answer with the whole document.
    Document(StatusCode),
    Value(StatusCode, Value),
}

struct Rejection {
    status: StatusCode,
    body: Option<Value>,
}

impl Rejection {
    fn new(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    fn shaped(status: StatusCode, value: &Value) -> Self {
        Self {
            status,
            body: Some(empty_shape(value)),
        }
    }
}

type VerbResult = Result<Reply, Rejection>;

/// Apply `op` to `document`.
pub fn apply(mut document: Value, op: &Operation<'_>) -> Outcome {
    let result = match op.verb {
        Verb::Get => get(&document, op),
        Verb::Post => post(&mut document, op),
        Verb::Put => put(&mut document, op),
        Verb::Patch => patch(&mut document, op),
        Verb::Delete => delete(&mut document, op),
    };
    finish(document, op.verb, result)
}

fn finish(document: Value, verb: Verb, result: VerbResult) -> Outcome {
    match result {
        Ok(reply) => {
            let (status, body) = match reply {
                Reply::Document(status) => (status, document.clone()),
                Reply::Value(status, value) => (status, value),
            };
            Outcome {
                status,
                body: Some(body),
                document: verb.is_mutating().then_some(document),
            }
        }
        Err(rejection) => Outcome {
            status: rejection.status,
            body: rejection.body,
            document: None,
        },
    }
}

fn get(document: &Value, op: &Operation<'_>) -> VerbResult {
    let target = resolve(document, op.segments)
        .and_then(|path| path.view(document))
        .or_else(|| resolve_direct(document, op.segments).and_then(|path| path.view(document)))
        .ok_or(Rejection::new(StatusCode::NOT_FOUND))?;

    let value = match target {
        Value::Array(items) if !op.query.is_empty() => Value::Array(filter::select(items, op.query)),
        other => other.clone(),
    };
    Ok(Reply::Value(StatusCode::OK, value))
}

fn post(document: &mut Value, op: &Operation<'_>) -> VerbResult {
    let body = require(op.body, document)?;

    if op.segments.is_empty() {
        return match (&mut *document, body) {
            (Value::Object(root), Value::Object(fields)) => {
                merge(root, fields);
                Ok(Reply::Document(StatusCode::OK))
            }
            (Value::Array(items), _) => {
                append(items, body);
                Ok(Reply::Document(StatusCode::OK))
            }
            (root, _) => Err(Rejection::shaped(StatusCode::BAD_REQUEST, root)),
        };
    }

    if let Some(path) = resolve(document, op.segments) {
        let keyed = matches!(path.accessors().last(), Some(Accessor::Key(_)));
        let target = path
            .view_mut(document)
            .ok_or(Rejection::new(StatusCode::NOT_FOUND))?;
        return match (target, body) {
            (Value::Array(items), _) => {
                append(items, body);
                Ok(Reply::Document(StatusCode::OK))
            }
            (Value::Object(existing), Value::Object(fields)) if keyed => {
                merge(existing, fields);
                Ok(Reply::Document(StatusCode::OK))
            }
            (target, _) if keyed && target.is_object() => {
                Err(Rejection::shaped(StatusCode::BAD_REQUEST, target))
            }
            (target, _) => Err(Rejection::shaped(StatusCode::UNPROCESSABLE_ENTITY, target)),
        };
    }

    let (parent_segments, last) = split_last(op.segments);
    let parent = locate(document, parent_segments).ok_or(Rejection::new(StatusCode::NOT_FOUND))?;
    match (parent, last) {
        (Value::Object(map), LastSegment::Key(key)) => {
            map.insert(key.to_string(), body.clone());
            Ok(Reply::Document(StatusCode::OK))
        }
        (parent, _) => Err(Rejection::shaped(StatusCode::UNPROCESSABLE_ENTITY, parent)),
    }
}

fn put(document: &mut Value, op: &Operation<'_>) -> VerbResult {
    let body = require(op.body, document)?;

    if op.segments.is_empty() {
        if !matches!(body, Value::Object(_) | Value::Array(_)) {
            return Err(Rejection::shaped(StatusCode::BAD_REQUEST, document));
        }
        *document = body.clone();
        return Ok(Reply::Document(StatusCode::OK));
    }

    if let Some(path) = resolve(document, op.segments) {
        let by_id = matches!(path.accessors().last(), Some(Accessor::Index(_)))
            && op.segments.last().map(String::as_str) != Some(BY_INDEX);
        let target = path
            .view_mut(document)
            .ok_or(Rejection::new(StatusCode::NOT_FOUND))?;
        let prior = std::mem::replace(target, body.clone());
        // Elements found by id answer with their emptied prior shape.
        return Ok(if by_id {
            Reply::Value(StatusCode::OK, empty_shape(&prior))
        } else {
            Reply::Document(StatusCode::OK)
        });
    }

    let (parent_segments, last) = split_last(op.segments);
    let parent = locate(document, parent_segments).ok_or(Rejection::new(StatusCode::NOT_FOUND))?;
    match (parent, last) {
        (Value::Array(items), LastSegment::Key(id)) => {
            let Value::Object(fields) = body else {
                return Err(Rejection::new(StatusCode::UNPROCESSABLE_ENTITY));
            };
            let created = with_id(id, fields);
            items.push(created.clone());
            Ok(Reply::Value(StatusCode::CREATED, created))
        }
        (Value::Object(map), LastSegment::Key(key)) => {
            map.insert(key.to_string(), body.clone());
            Ok(Reply::Value(StatusCode::CREATED, body.clone()))
        }
        // Index past the end of the array.
        (parent, LastSegment::Index) if parent.is_array() || parent.is_object() => {
            Err(Rejection::shaped(StatusCode::UNPROCESSABLE_ENTITY, parent))
        }
        (parent, _) => Err(Rejection::shaped(StatusCode::BAD_REQUEST, parent)),
    }
}

fn patch(document: &mut Value, op: &Operation<'_>) -> VerbResult {
    let body = require(op.body, document)?;

    let path = resolve(document, op.segments).ok_or(Rejection::new(StatusCode::BAD_REQUEST))?;
    let target = path
        .view_mut(document)
        .ok_or(Rejection::new(StatusCode::BAD_REQUEST))?;
    match (target, body) {
        (Value::Object(existing), Value::Object(fields)) => {
            merge(existing, fields);
            Ok(Reply::Document(StatusCode::OK))
        }
        (target, _) => Err(Rejection::shaped(StatusCode::BAD_REQUEST, target)),
    }
}

fn delete(document: &mut Value, op: &Operation<'_>) -> VerbResult {
    if op.segments.is_empty() {
        return Err(Rejection::shaped(StatusCode::BAD_REQUEST, document));
    }

    let path = resolve(document, op.segments).ok_or(Rejection::new(StatusCode::NOT_FOUND))?;

    if !op.query.is_empty() {
        if let Some(Value::Array(items)) = path.view_mut(document) {
            let removed = filter::remove_matching(items, op.query);
            tracing::debug!(removed, "Removed elements matching query");
            return Ok(Reply::Document(StatusCode::OK));
        }
    }

    let (parent, last) = path
        .split_last()
        .ok_or_else(|| Rejection::new(StatusCode::BAD_REQUEST))?;
    match (parent.view_mut(document), last) {
        (Some(Value::Array(items)), Accessor::Index(index)) if *index < items.len() => {
            items.remove(*index);
        }
        (Some(Value::Object(map)), Accessor::Key(key)) => {
            map.shift_remove(key);
        }
        _ => return Err(Rejection::new(StatusCode::NOT_FOUND)),
    }
    Ok(Reply::Document(StatusCode::OK))
}

fn locate<'a>(document: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    let path = resolve(document, segments)?;
    path.view_mut(document)
}

/// Last segment of a request path, with the `byindex` token folded in.
enum LastSegment<'a> {
    Key(&'a str),
    Index,
}

fn split_last(segments: &[String]) -> (&[String], LastSegment<'_>) {
    match segments {
        [parent @ .., _, token] if token == BY_INDEX => (parent, LastSegment::Index),
        [parent @ .., key] => (parent, LastSegment::Key(key)),
        [] => (segments, LastSegment::Key("")),
    }
}

fn require<'a>(body: Option<&'a Value>, document: &Value) -> Result<&'a Value, Rejection> {
    body.ok_or_else(|| Rejection::shaped(StatusCode::BAD_REQUEST, document))
}

/// `{}` for objects, `[]` for arrays, `null` for anything else.
pub fn empty_shape(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

fn merge(target: &mut Map<String, Value>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}

fn append(items: &mut Vec<Value>, body: &Value) {
    match body {
        Value::Array(more) => items.extend(more.iter().cloned()),
        other => items.push(other.clone()),
    }
}

/// `{"id": <segment>}` followed by the body fields; the body's own `id` wins.
fn with_id(segment: &str, fields: &Map<String, Value>) -> Value {
    let mut created = Map::new();
    if !fields.contains_key("id") {
        let id = segment
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(segment.to_string()));
        created.insert("id".to_string(), id);
    }
    merge(&mut created, fields);
    Value::Object(created)
}
