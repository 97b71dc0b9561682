//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a default so minimal configs work.

use serde::{Deserialize, Serialize};

/// Root configuration for the API server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// API mounting and self-reference settings.
    pub api: ApiConfig,

    /// Token lifetimes and refresh behavior.
    pub auth: AuthConfig,

    /// Outbound mail settings (delivery credentials come from env).
    pub smtp: SmtpConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// API mounting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix every compiled route is mounted under.
    pub prefix: String,

    /// Externally reachable base URL, used in mailed links.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Token lifetime configuration, in minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of login tokens.
    pub token_ttl_minutes: u64,

    /// Lifetime of email verification tokens.
    pub verification_ttl_minutes: u64,

    /// Lifetime of password reset tokens.
    pub reset_ttl_minutes: u64,

    /// A token refresh within this window of expiry issues a new token.
    pub refresh_window_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 30,
            verification_ttl_minutes: 60,
            reset_ttl_minutes: 15,
            refresh_window_minutes: 5,
        }
    }
}

/// Outbound mail configuration. The password is environment-only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub from_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 465,
            username: String::new(),
            from_email: String::new(),
        }
    }
}
