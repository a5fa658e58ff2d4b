//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → args.rs (command-line overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Cli;
pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    JsonDbConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
