//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (walk entries in registration order)
//!     → matcher.rs (method slot, then path pattern)
//!     → pattern.rs (segment matching, params)
//!     → Return: RouteMatch or None
//!
//! Registration (at startup):
//!     get/post/put/patch/delete/any(|| RouteConfig)
//!     → compile PathPattern
//!     → append entry (or replace the method slot in place)
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable while serving
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::{MethodKey, RouteMatch};
pub use pattern::{Params, PathPattern, PatternError, PatternMatch};
pub use router::{RouteConfig, RouteDefinition, RouteTable};
