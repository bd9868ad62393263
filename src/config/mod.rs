//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → `apps` applied to the app registry (deploy / undeploy)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Only the app table is hot-reloaded; listener and server settings
//!   apply at startup
//! - Invalid reloads are logged and ignored

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig,
};
pub use watcher::ConfigWatcher;
