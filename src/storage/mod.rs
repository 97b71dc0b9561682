//! User storage collaborator.
//!
//! # Responsibilities
//! - Define the store interface the account handlers depend on
//! - Translate native storage error codes into response statuses
//!
//! # Design Decisions
//! - The framework core never sees these types; the store rides through
//!   dispatch as part of the opaque services handle
//! - Any SQL-backed implementation of [`UserStore`] must use parameter
//!   binding, never string-formatted queries

pub mod memory;

pub use memory::MemoryStore;

use uuid::Uuid;

use crate::api::ApiStatus;

/// A stored user account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    /// Unix timestamp, seconds.
    pub created_at: u64,
}

/// Partial update for a user record. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.email_verified.is_none()
    }
}

/// Native storage failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Value is not unique")]
    NotUnique,

    #[error("Invalid column name")]
    UnknownField,

    #[error("{message}")]
    Other { code: u16, message: String },
}

/// Translation table into response statuses. Recognized errors map to
/// 400-class codes; anything else passes its native code and message
/// through unchanged.
impl From<StorageError> for ApiStatus {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotUnique => ApiStatus::bad_request("Value is not unique"),
            StorageError::UnknownField => ApiStatus::bad_request("Invalid column name"),
            StorageError::Other { code, message } => ApiStatus::with_message(code, message),
        }
    }
}

/// Interface the account handlers consume. Implementations own their
/// thread-safety; handlers assume at-most-one logical owner per request.
pub trait UserStore: Send + Sync {
    fn create(&self, user: User) -> Result<(), StorageError>;
    fn get(&self, id: &Uuid) -> Result<Option<User>, StorageError>;
    fn get_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
    fn update(&self, id: &Uuid, patch: UserPatch) -> Result<bool, StorageError>;
    fn delete(&self, id: &Uuid) -> Result<bool, StorageError>;
}
