//! Password hashing seam and strength policy.
//!
//! `SaltedHasher` is a process-local stand-in: salted and iterated, but
//! not a memory-hard KDF. Production deployments should wire a real KDF
//! behind the same trait.

use std::hash::{DefaultHasher, Hash, Hasher};

use uuid::Uuid;

/// Human-readable strength requirements, surfaced in 400 responses.
pub const PASSWORD_RULES: &str =
    "Password must be at least 8 characters and contain an uppercase letter, \
     a lowercase letter, a digit and a special character";

const SPECIAL: &str = "!@#$%^&*(),.?<>:;-_";

/// Minimum strength gate applied on registration and password change.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL.contains(c))
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, hashed: &str, password: &str) -> bool;
}

/// Salted, iterated in-process hasher. Hash format: `salt$digest`.
#[derive(Default)]
pub struct SaltedHasher;

impl SaltedHasher {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &str, password: &str, rounds: u32) -> u64 {
        let mut value = 0u64;
        for _ in 0..rounds {
            let mut hasher = DefaultHasher::new();
            salt.hash(&mut hasher);
            password.hash(&mut hasher);
            value.hash(&mut hasher);
            value = hasher.finish();
        }
        value
    }
}

impl PasswordHasher for SaltedHasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, password, 1024);
        format!("{salt}${digest:016x}")
    }

    fn verify(&self, hashed: &str, password: &str) -> bool {
        let Some((salt, digest)) = hashed.split_once('$') else {
            return false;
        };
        format!("{:016x}", Self::digest(salt, password, 1024)) == digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_is_salted() {
        let hasher = SaltedHasher::new();
        let h1 = hasher.hash("Sup3r-Secret");
        let h2 = hasher.hash("Sup3r-Secret");
        assert_ne!(h1, h2);
        assert!(hasher.verify(&h1, "Sup3r-Secret"));
        assert!(hasher.verify(&h2, "Sup3r-Secret"));
        assert!(!hasher.verify(&h1, "wrong"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = SaltedHasher::new();
        assert!(!hasher.verify("garbage", "anything"));
    }

    #[test]
    fn strength_policy() {
        assert!(is_strong_password("Sup3r-Secret"));
        assert!(!is_strong_password("Shrt1!a"));
        assert!(is_strong_password("Short1!a"));
        assert!(!is_strong_password("alllowercase1!"));
        assert!(!is_strong_password("ALLUPPERCASE1!"));
        assert!(!is_strong_password("NoDigitsHere!"));
        assert!(!is_strong_password("NoSpecials123"));
    }
}
