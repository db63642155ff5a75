//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (ERC8004_* environment overrides)
//!     → validation.rs (presence and semantic checks)
//!     → ResolvedConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file so secrets can stay out of it
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{AppConfig, FeeConfig, NetworkConfig, WorkflowConfig};
pub use validation::{ResolvedConfig, ValidationError};
