//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),
}

/// Load configuration: TOML file if given, then environment overrides,
/// then semantic validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml::from_str(&fs::read_to_string(p)?)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Environment variables override file values. Secrets and deployment
/// addresses live here, not in the file.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(addr) = std::env::var("TRELLIS_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Ok(url) = std::env::var("TRELLIS_BASE_URL") {
        config.api.base_url = url;
    }
    if let Ok(server) = std::env::var("SMTP_SERVER") {
        config.smtp.server = server;
    }
    if let Ok(port) = std::env::var("SMTP_PORT") {
        if let Ok(port) = port.parse() {
            config.smtp.port = port;
        } else {
            tracing::warn!(value = %port, "Ignoring unparseable SMTP_PORT");
        }
    }
    if let Ok(username) = std::env::var("SMTP_USERNAME") {
        config.smtp.from_email = username.clone();
        config.smtp.username = username;
    }
}
