//! In-memory credential verifier.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::hash::verify_hash;
use crate::result::AuthResult;
use crate::traits::CredentialVerifier;

/// Fixed username-to-hash table.
///
/// Hashes use the same schemes as the credential file. Suitable for
/// embedding and tests; production deployments use
/// [`CredentialStore`](crate::CredentialStore).
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentials {
    users: HashMap<String, String>,
}

impl MemoryCredentials {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(username, hash)` pairs. Later duplicates are ignored.
    pub fn from_pairs<I, U, H>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        let mut users = HashMap::new();
        for (u, h) in pairs {
            users.entry(u.into()).or_insert_with(|| h.into());
        }
        Self { users }
    }

    /// Insert or replace a user.
    #[inline]
    pub fn insert(&mut self, username: impl Into<String>, hash: impl Into<String>) {
        self.users.insert(username.into(), hash.into());
    }

    #[inline]
    pub fn remove(&mut self, username: &str) -> bool {
        self.users.remove(username).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for MemoryCredentials {
    async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        let hash = self.users.get(username).ok_or(AuthError::NotFound)?;
        if verify_hash(password, hash) {
            Ok(AuthResult::with_user_id(username))
        } else {
            Err(AuthError::Invalid)
        }
    }
}
