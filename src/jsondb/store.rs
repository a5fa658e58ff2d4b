//! Document storage.
//!
//! # Responsibilities
//! - Read and write the raw document text (`DocumentStore`)
//! - Classify the text as JSON or opaque raw content
//! - Persist mutated documents as pretty-printed JSON
//!
//! # Design Decisions
//! - No caching: every request reads the file again
//! - Concurrent writers are not coordinated, the last write wins
//! - Writes land in a sibling temp file renamed over the document, so
//!   readers see either the old or the new content

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the document text lives.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    async fn read(&self) -> Result<String, StoreError>;

    /// Replace the whole content.
    async fn write(&self, contents: &str) -> Result<(), StoreError>;
}

/// Document kept in one file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Unique sibling of the document file, on the same filesystem.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self) -> Result<String, StoreError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })
    }

    async fn write(&self, contents: &str) -> Result<(), StoreError> {
        let staging = self.staging_path();
        let result = match tokio::fs::write(&staging, contents).await {
            Ok(()) => tokio::fs::rename(&staging, &self.path).await,
            Err(e) => Err(e),
        };

        if let Err(source) = result {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }
}

/// Document held in memory. `None` behaves like a missing file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: RwLock::new(Some(contents.into())),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self) -> Result<String, StoreError> {
        self.contents
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::Read {
                path: PathBuf::from("<memory>"),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
    }

    async fn write(&self, contents: &str) -> Result<(), StoreError> {
        *self.contents.write().await = Some(contents.to_string());
        Ok(())
    }
}

/// Loaded document content.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// A JSON object or array.
    Json(Value),
    /// Anything else, served back verbatim.
    Raw(String),
}

impl Document {
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::Json(Value::Object(Map::new()));
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self::Json(value),
            _ => Self::Raw(text.to_string()),
        }
    }
}

/// Read and classify the document; `None` when it cannot be read.
pub async fn load(store: &dyn DocumentStore) -> Option<Document> {
    match store.read().await {
        Ok(text) => Some(Document::parse(&text)),
        Err(e) => {
            tracing::warn!(error = %e, "Document unavailable");
            metrics::record_load_failure();
            None
        }
    }
}

/// Write `document` back as pretty-printed JSON.
pub async fn persist(store: &dyn DocumentStore, document: &Value) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(document)?;
    store.write(&contents).await?;
    metrics::record_document_write();
    tracing::debug!(bytes = contents.len(), "Document persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_classifies_content() {
        assert_eq!(Document::parse(""), Document::Json(json!({})));
        assert_eq!(Document::parse("  \n"), Document::Json(json!({})));
        assert_eq!(Document::parse(r#"{"a": [1]}"#), Document::Json(json!({"a": [1]})));
        assert_eq!(Document::parse("[]"), Document::Json(json!([])));
        assert_eq!(Document::parse("42"), Document::Raw("42".into()));
        assert_eq!(Document::parse("{broken"), Document::Raw("{broken".into()));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("db.json"));
        assert!(load(&store).await.is_none());

        persist(&store, &json!({"genres": ["comedy"]})).await.unwrap();
        let text = store.read().await.unwrap();
        assert!(text.contains('\n'), "pretty-printed");
        assert_eq!(
            load(&store).await,
            Some(Document::Json(json!({"genres": ["comedy"]})))
        );
    }

    #[tokio::test]
    async fn test_file_store_write_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("db.json"));
        store.write("{}").await.unwrap();
        store.write(r#"{"a": 1}"#).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json".to_string()]);
        assert_eq!(store.read().await.unwrap(), r#"{"a": 1}"#);
    }

    #[tokio::test]
    async fn test_file_store_write_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing").join("db.json"));
        match store.write("{}").await {
            Err(StoreError::Write { path, .. }) => assert!(path.ends_with("missing/db.json")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_readers_never_see_a_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path().join("db.json")));
        let document: Map<String, Value> = (0..5_000)
            .map(|i| (format!("key{i}"), json!(i)))
            .collect();
        persist(store.as_ref(), &Value::Object(document.clone())).await.unwrap();

        let writer = {
            let store = store.clone();
            let document = document.clone();
            tokio::spawn(async move {
                for round in 0..20 {
                    let mut next = document.clone();
                    next.insert("key1".into(), json!(round));
                    persist(store.as_ref(), &Value::Object(next)).await.unwrap();
                }
            })
        };

        for _ in 0..60 {
            match load(store.as_ref()).await {
                Some(Document::Json(value)) => assert_eq!(value["key2"], json!(2)),
                other => panic!("partial read: {:?}", other.map(|_| ())),
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::missing();
        assert!(matches!(store.read().await, Err(StoreError::Read { .. })));
        store.write("[1]").await.unwrap();
        assert_eq!(store.contents().await.as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_persist_output_reparses_to_same_value() {
        let store = MemoryStore::missing();
        let document = json!({"z": 1, "a": {"nested": [true, null, "x"]}});
        persist(&store, &document).await.unwrap();
        let reloaded = load(&store).await.unwrap();
        assert_eq!(reloaded, Document::Json(document.clone()));

        persist(&store, &document).await.unwrap();
        let first = store.contents().await.unwrap();
        persist(&store, &document).await.unwrap();
        assert_eq!(store.contents().await.unwrap(), first);
    }
}
