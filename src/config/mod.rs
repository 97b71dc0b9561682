//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (TRELLIS_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: secrets, SMTP, base URL)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so a bare process still starts
//! - Secrets never live in the file; they come from the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ApiConfig, AppConfig, AuthConfig, ListenerConfig, SmtpConfig};
