//! Authentication collaborators: token service and password hashing.
//!
//! # Design Decisions
//! - Both are trait seams; the framework core only threads them through
//!   as part of the opaque services handle
//! - Token and hashing failures translate into response statuses at the
//!   dispatch boundary, never crash the request path

pub mod password;
pub mod tokens;

pub use password::{is_strong_password, PasswordHasher, SaltedHasher, PASSWORD_RULES};
pub use tokens::{Claims, MemoryTokens, TokenError, TokenService};
