//! Outbound mail collaborator.
//!
//! # Responsibilities
//! - Build verification and password-reset links from the configured
//!   base URL
//! - Hand messages to a delivery backend
//!
//! # Design Decisions
//! - Delivery itself is external; the default backend logs the message
//!   instead of speaking SMTP, which also keeps tests hermetic

use std::sync::Mutex;

pub trait Mailer: Send + Sync {
    fn send_verification(&self, to: &str, token: &str);
    fn send_password_reset(&self, to: &str, token: &str);
}

/// Logs outbound mail through tracing instead of delivering it.
pub struct LogMailer {
    base_url: String,
}

impl LogMailer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn verification_link(&self, token: &str) -> String {
        format!("{}/api/user/verify?token={}", self.base_url, token)
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/api/user/reset?token={}", self.base_url, token)
    }
}

impl Mailer for LogMailer {
    fn send_verification(&self, to: &str, token: &str) {
        tracing::info!(
            to = %to,
            link = %self.verification_link(token),
            "Verification mail queued"
        );
    }

    fn send_password_reset(&self, to: &str, token: &str) {
        tracing::info!(
            to = %to,
            link = %self.reset_link(token),
            "Password reset mail queued"
        );
    }
}

/// Records outbound mail for assertions. Test collaborator.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages as `(kind, recipient, token)` tuples.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().expect("mailer poisoned").clone()
    }

    /// The token of the most recent message of the given kind.
    pub fn last_token(&self, kind: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|(k, _, _)| k == kind)
            .map(|(_, _, t)| t.clone())
    }

    fn record(&self, kind: &str, to: &str, token: &str) {
        self.sent
            .lock()
            .expect("mailer poisoned")
            .push((kind.to_string(), to.to_string(), token.to_string()));
    }
}

impl Mailer for RecordingMailer {
    fn send_verification(&self, to: &str, token: &str) {
        self.record("verification", to, token);
    }

    fn send_password_reset(&self, to: &str, token: &str) {
        self.record("reset", to, token);
    }
}
