//! JSON document subsystem.
//!
//! # Data Flow
//! ```text
//! Request below the base path (method, remainder, query, body)
//!     → store.rs (read file, classify JSON / raw)
//!     → path.rs (segments → LensPath)
//!     → verbs.rs (apply GET/POST/PUT/PATCH/DELETE policy)
//!     → store.rs (persist unless dry-run)
//!     → HandlerOutput (status, body)
//! ```
//!
//! # Design Decisions
//! - The document is read fresh on every request
//! - Path resolution and mutation are pure and unit-testable
//! - `handler.rs` is the only part touching the request context

pub mod filter;
pub mod handler;
pub mod path;
pub mod store;
pub mod verbs;

pub use handler::JsonDb;
pub use path::{Accessor, LensPath, BY_INDEX};
pub use store::{Document, DocumentStore, FileStore, MemoryStore, StoreError};
pub use verbs::{Operation, Outcome, Verb};
