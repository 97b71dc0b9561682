//! In-memory user store.
//!
//! Keeps accounts in a mutex-guarded map and enforces the unique-email
//! constraint the way a relational store's unique index would.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::storage::{StorageError, User, UserPatch, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().expect("store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryStore {
    fn create(&self, user: User) -> Result<(), StorageError> {
        let mut users = self.users.lock().expect("store poisoned");
        let taken = users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email));
        if taken || users.contains_key(&user.id) {
            return Err(StorageError::NotUnique);
        }
        users.insert(user.id, user);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.users.lock().expect("store poisoned").get(id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .users
            .lock()
            .expect("store poisoned")
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn update(&self, id: &Uuid, patch: UserPatch) -> Result<bool, StorageError> {
        let mut users = self.users.lock().expect("store poisoned");

        if let Some(email) = &patch.email {
            let taken = users
                .values()
                .any(|u| u.id != *id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(StorageError::NotUnique);
            }
        }

        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(verified) = patch.email_verified {
            user.email_verified = verified;
        }
        Ok(true)
    }

    fn delete(&self, id: &Uuid) -> Result<bool, StorageError> {
        Ok(self
            .users
            .lock()
            .expect("store poisoned")
            .remove(id)
            .is_some())
    }
}
