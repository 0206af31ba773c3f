//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, apply environment overrides)
//!     → validation.rs (semantic checks)
//!     → RedirectConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::RedirectConfig;
pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, OriginConfig};
pub use schema::{RedirectSettings, TableLocation, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
