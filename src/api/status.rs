//! Status codes and the response envelope.
//!
//! # Responsibilities
//! - Map numeric status codes to default human-readable messages
//! - Build the uniform `{status: {code, message}, data?}` wire shape
//! - Serve as the early-exit signal type for handlers
//!
//! # Design Decisions
//! - The code table is closed; a code outside it requires an explicit
//!   message at construction time
//! - `ApiStatus` doubles as an error type so handlers can `?` their way
//!   out of a request with both error and success responses (e.g. a bare
//!   201 Created)

use serde_json::{json, Map, Value};

use crate::api::ApiError;

/// Default messages for every status code the framework will emit.
pub const STATUS_TABLE: &[(u16, &str)] = &[
    (200, "Ok"),
    (201, "Created"),
    (202, "Accepted"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (304, "Not Modified"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
];

/// Look up the default message for a code.
pub fn default_message(code: u16) -> Option<&'static str> {
    STATUS_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, m)| *m)
}

/// A status code with an optional overriding message.
///
/// Handlers return (or raise via `Err`) an `ApiStatus` to short-circuit a
/// request; the dispatcher turns it into the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStatus {
    code: u16,
    message: Option<String>,
}

impl ApiStatus {
    /// Create a status from a code in the table.
    ///
    /// Codes outside the table must use [`ApiStatus::with_message`].
    pub fn from_code(code: u16) -> Result<Self, ApiError> {
        if default_message(code).is_none() {
            return Err(ApiError::UnknownStatusCode(code));
        }
        Ok(Self {
            code,
            message: None,
        })
    }

    /// Create a status with an explicit message. Works for any code.
    pub fn with_message(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn ok() -> Self {
        Self { code: 200, message: None }
    }

    pub fn created() -> Self {
        Self { code: 201, message: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_message(401, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(404, message)
    }

    /// A 404 carrying the table default message.
    pub fn not_found_default() -> Self {
        Self { code: 404, message: None }
    }

    pub fn method_not_allowed() -> Self {
        Self { code: 405, message: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(500, message)
    }

    pub fn not_implemented() -> Self {
        Self { code: 501, message: None }
    }

    /// Attach or replace the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    /// The effective message: explicit if set, otherwise the table default.
    pub fn text(&self) -> &str {
        match &self.message {
            Some(m) => m,
            None => default_message(self.code).unwrap_or(""),
        }
    }

    /// The bare envelope for this status: `{"status": {"code", "message"}}`.
    pub fn envelope(&self) -> Value {
        json!({
            "status": {
                "code": self.code,
                "message": self.text(),
            }
        })
    }

    /// Envelope with a payload nested under `data`.
    pub fn envelope_with_data(&self, data: Value) -> Value {
        let mut env = self.envelope();
        env.as_object_mut()
            .expect("envelope is always an object")
            .insert("data".to_string(), data);
        env
    }

    /// Envelope with the given fields merged at the top level, next to
    /// `status`. Used for the `(mapping, code)` handler return shape.
    pub fn envelope_merged(&self, fields: Map<String, Value>) -> Value {
        let mut env = self.envelope();
        let obj = env.as_object_mut().expect("envelope is always an object");
        for (key, value) in fields {
            obj.insert(key, value);
        }
        env
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.text())
    }
}

impl std::error::Error for ApiStatus {}
