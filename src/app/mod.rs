//! The user-account application built on the endpoint tree.
//!
//! # Design Decisions
//! - Collaborators are constructed once at startup and injected as one
//!   shared [`Services`] handle; handlers reach them through the request
//!   context instead of globals

pub mod pages;
pub mod tree;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiStatus, RequestContext};
use crate::auth::{MemoryTokens, PasswordHasher, SaltedHasher, TokenService};
use crate::config::{AppConfig, AuthConfig};
use crate::mail::{LogMailer, Mailer};
use crate::storage::{MemoryStore, User, UserStore};

pub use tree::build_api;

/// Every collaborator the account handlers depend on, plus the auth
/// timing knobs. Shared across requests; each field owns its own
/// thread-safety.
pub struct Services {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordHasher>,
    pub mail: Arc<dyn Mailer>,
    pub auth: AuthConfig,
}

impl Services {
    /// Fully in-process wiring: memory store, memory tokens, logging
    /// mailer.
    pub fn in_memory(config: &AppConfig) -> Arc<Self> {
        Self::with_mailer(config, Arc::new(LogMailer::new(config.api.base_url.clone())))
    }

    /// Same wiring with a caller-supplied mail backend.
    pub fn with_mailer(config: &AppConfig, mail: Arc<dyn Mailer>) -> Arc<Self> {
        Arc::new(Self {
            users: Arc::new(MemoryStore::new()),
            tokens: Arc::new(MemoryTokens::new()),
            passwords: Arc::new(SaltedHasher::new()),
            mail,
            auth: config.auth.clone(),
        })
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl_minutes * 60)
    }

    pub fn verification_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.verification_ttl_minutes * 60)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.reset_ttl_minutes * 60)
    }

    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.auth.refresh_window_minutes * 60)
    }
}

/// Resolve the requesting user from the `Authentication` header.
pub fn authenticated(ctx: &RequestContext<Services>) -> Result<User, ApiStatus> {
    let token = ctx.auth_token()?;
    let claims = ctx.services.tokens.verify(token)?;
    ctx.services
        .users
        .get(&claims.user_id)
        .map_err(ApiStatus::from)?
        .ok_or_else(|| ApiStatus::not_found("User not found"))
}
