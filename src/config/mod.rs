//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SidecarConfig (validated, immutable)
//!     → handed to the admin server, rotator and process supervisor
//! ```
//!
//! # Design Decisions
//! - Config is validated once, before anything starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, ObservabilityConfig, ProcessConfig, ReopenSignal, RotationConfig, SidecarConfig};
pub use validation::{validate_config, ValidationError};
