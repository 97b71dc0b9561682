//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted; the process does not start on
//!   an invalid config

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    BadBindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("api.prefix must start with '/' and not end with one: '{0}'")]
    BadPrefix(String),

    #[error("api.base_url must not end with '/': '{0}'")]
    BadBaseUrl(String),

    #[error("auth.{0} must be greater than zero")]
    ZeroTtl(&'static str),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let prefix = &config.api.prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::BadPrefix(prefix.clone()));
    }
    if config.api.base_url.ends_with('/') {
        errors.push(ValidationError::BadBaseUrl(config.api.base_url.clone()));
    }

    for (name, value) in [
        ("token_ttl_minutes", config.auth.token_ttl_minutes),
        (
            "verification_ttl_minutes",
            config.auth.verification_ttl_minutes,
        ),
        ("reset_ttl_minutes", config.auth.reset_ttl_minutes),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTtl(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
