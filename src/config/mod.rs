//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON/YAML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → Bridge::connect_with_config
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → Bridge::reload_config swaps the snapshot and resyncs routes
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes replace it as a whole
//! - All fields have defaults to allow minimal configs
//! - The route table is derived from config, never the other way round

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{AdminConfig, BridgeConfig, HttpClientConfig, ObservabilityConfig, RouteConfig, TransportOptions};
