//! Opaque bearer tokens with server-side expiry.
//!
//! # Responsibilities
//! - Issue tokens bound to a user id with a time-to-live
//! - Verify tokens, rejecting unknown and expired ones
//! - Answer whether a token is close enough to expiry to warrant a refresh
//!
//! # Design Decisions
//! - Tokens are random opaque ids; all state lives server-side, so
//!   revocation is a map removal

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::api::ApiStatus;

/// What a verified token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    pub user_id: Uuid,
    pub expires_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Token failures are authentication failures on the wire.
impl From<TokenError> for ApiStatus {
    fn from(err: TokenError) -> Self {
        ApiStatus::unauthorized(err.to_string())
    }
}

pub trait TokenService: Send + Sync {
    /// Issue a token for the user, valid for `ttl`.
    fn issue(&self, user_id: Uuid, ttl: Duration) -> String;

    /// Verify a token, returning its claims.
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;

    /// Whether the token expires within the given window.
    fn expires_within(&self, token: &str, window: Duration) -> Result<bool, TokenError> {
        let claims = self.verify(token)?;
        let now = SystemTime::now();
        Ok(claims
            .expires_at
            .duration_since(now)
            .map(|left| left < window)
            .unwrap_or(true))
    }

    /// Revoke a token, if it exists.
    fn revoke(&self, token: &str);
}

/// In-process token store. Expired entries are dropped on verification
/// and swept whenever a new token is issued.
#[derive(Default)]
pub struct MemoryTokens {
    tokens: Mutex<HashMap<String, Claims>>,
}

impl MemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored token count, live and not-yet-swept expired entries alike.
    pub fn len(&self) -> usize {
        self.tokens.lock().expect("token store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenService for MemoryTokens {
    fn issue(&self, user_id: Uuid, ttl: Duration) -> String {
        let token = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let claims = Claims {
            user_id,
            expires_at: now + ttl,
        };
        let mut tokens = self.tokens.lock().expect("token store poisoned");
        // Abandoned tokens (verification mails never clicked, logins
        // never refreshed) would otherwise accumulate for the process
        // lifetime.
        tokens.retain(|_, c| c.expires_at > now);
        tokens.insert(token.clone(), claims);
        token
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut tokens = self.tokens.lock().expect("token store poisoned");
        let claims = *tokens.get(token).ok_or(TokenError::Invalid)?;
        if claims.expires_at <= SystemTime::now() {
            tokens.remove(token);
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn revoke(&self, token: &str) {
        self.tokens
            .lock()
            .expect("token store poisoned")
            .remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let service = MemoryTokens::new();
        let user_id = Uuid::new_v4();
        let token = service.issue(user_id, Duration::from_secs(60));
        assert_eq!(service.verify(&token).unwrap().user_id, user_id);
    }

    #[test]
    fn unknown_token_is_invalid() {
        let service = MemoryTokens::new();
        assert_eq!(service.verify("nope"), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_rejected_and_dropped() {
        let service = MemoryTokens::new();
        let token = service.issue(Uuid::new_v4(), Duration::ZERO);
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
        // Second lookup no longer finds it at all.
        assert_eq!(service.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_tokens_are_swept_on_issue() {
        let service = MemoryTokens::new();
        let stale = service.issue(Uuid::new_v4(), Duration::ZERO);
        assert_eq!(service.len(), 1);

        let fresh = service.issue(Uuid::new_v4(), Duration::from_secs(60));
        assert_eq!(service.len(), 1);
        assert_eq!(service.verify(&stale), Err(TokenError::Invalid));
        assert!(service.verify(&fresh).is_ok());
    }

    #[test]
    fn expiry_window_check() {
        let service = MemoryTokens::new();
        let long = service.issue(Uuid::new_v4(), Duration::from_secs(3600));
        assert!(!service.expires_within(&long, Duration::from_secs(300)).unwrap());
        let short = service.issue(Uuid::new_v4(), Duration::from_secs(60));
        assert!(service.expires_within(&short, Duration::from_secs(300)).unwrap());
    }

    #[test]
    fn revoked_token_stops_verifying() {
        let service = MemoryTokens::new();
        let token = service.issue(Uuid::new_v4(), Duration::from_secs(60));
        service.revoke(&token);
        assert_eq!(service.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn token_errors_translate_to_401() {
        let status: ApiStatus = TokenError::Expired.into();
        assert_eq!(status.code(), 401);
        assert_eq!(status.text(), "Token expired");
        let status: ApiStatus = TokenError::Invalid.into();
        assert_eq!(status.text(), "Invalid token");
    }
}
