//! Path resolution over a JSON document.
//!
//! # Responsibilities
//! - Turn raw request segments into concrete accessors (`LensPath`)
//! - Address array elements by `id` (loose equality) or by position
//!   when the `byindex` token follows the segment
//! - Read and write through a resolved path
//!
//! # Design Decisions
//! - `Some(LensPath::root())` is the document itself, `None` is unresolved
//! - Lens paths are recomputed per request and never cached

use serde_json::Value;

use crate::jsondb::filter::loose_eq;
use crate::routing::pattern::decode;

/// Segment marking the previous segment as a zero-based array position.
pub const BY_INDEX: &str = "byindex";

/// One concrete step into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Key(String),
    Index(usize),
}

/// Ordered accessors from the document root to a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LensPath {
    accessors: Vec<Accessor>,
}

impl LensPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn push(&mut self, accessor: Accessor) {
        self.accessors.push(accessor);
    }

    /// Parent path and last accessor; `None` at the root.
    pub fn split_last(&self) -> Option<(LensPath, &Accessor)> {
        let (last, parent) = self.accessors.split_last()?;
        Some((
            LensPath {
                accessors: parent.to_vec(),
            },
            last,
        ))
    }

    pub fn view<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.accessors
            .iter()
            .try_fold(document, |value, accessor| match (value, accessor) {
                (Value::Object(map), Accessor::Key(key)) => map.get(key),
                (Value::Array(items), Accessor::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    pub fn view_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        self.accessors
            .iter()
            .try_fold(document, |value, accessor| match (value, accessor) {
                (Value::Object(map), Accessor::Key(key)) => map.get_mut(key),
                (Value::Array(items), Accessor::Index(index)) => items.get_mut(*index),
                _ => None,
            })
    }
}

/// Resolve `segments` against `document`.
pub fn resolve(document: &Value, segments: &[String]) -> Option<LensPath> {
    let mut path = LensPath::root();
    let mut current = document;
    let mut position = 0;

    while let Some(segment) = segments.get(position) {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
                path.push(Accessor::Key(segment.clone()));
                position += 1;
            }
            Value::Array(items) => {
                let by_index = segments
                    .get(position + 1)
                    .is_some_and(|next| next == BY_INDEX);
                let index = if by_index {
                    let index: usize = segment.parse().ok()?;
                    (index < items.len()).then_some(index)?
                } else {
                    items
                        .iter()
                        .position(|item| item.get("id").is_some_and(|id| loose_eq(id, segment)))?
                };
                current = &items[index];
                path.push(Accessor::Index(index));
                position += if by_index { 2 } else { 1 };
            }
            _ => return None,
        }
    }

    Some(path)
}

/// Plain traversal used when restful resolution fails on a read: arrays of
/// elements without an `id` are indexed by numeric segments.
pub fn resolve_direct(document: &Value, segments: &[String]) -> Option<LensPath> {
    let mut path = LensPath::root();
    let mut current = document;

    for segment in segments {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
                path.push(Accessor::Key(segment.clone()));
            }
            Value::Array(items) => {
                let index = if items.iter().any(|item| item.get("id").is_some()) {
                    items
                        .iter()
                        .position(|item| item.get("id").is_some_and(|id| loose_eq(id, segment)))?
                } else {
                    segment.parse().ok()?
                };
                current = items.get(index)?;
                path.push(Accessor::Index(index));
            }
            _ => return None,
        }
    }

    Some(path)
}

/// Split a request path into decoded, non-empty segments.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode)
        .collect()
}
