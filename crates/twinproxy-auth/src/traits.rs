//! Credential verifier trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::result::AuthResult;

/// Checks a username/password pair.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are called
/// concurrently from many connections.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify `password` for `username`.
    ///
    /// # Returns
    /// * `Ok(AuthResult)` - credentials accepted
    /// * `Err(AuthError::NotFound)` - unknown user
    /// * `Err(AuthError::Invalid)` - wrong password
    /// * `Err(_)` - the credential source could not be consulted
    async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, AuthError>;
}

#[async_trait]
impl<V: CredentialVerifier + ?Sized> CredentialVerifier for Arc<V> {
    #[inline]
    async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        (**self).verify(username, password).await
    }
}

#[async_trait]
impl<V: CredentialVerifier + ?Sized> CredentialVerifier for Box<V> {
    #[inline]
    async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        (**self).verify(username, password).await
    }
}
