//! Accept/deny decisions shared by both frontends.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::basic::parse_basic;
use crate::error::AuthError;
use crate::result::AuthDecision;
use crate::store::CredentialStore;
use crate::traits::CredentialVerifier;

/// Which authentication a frontend must demand from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Every client is allowed without credentials.
    NoAuth,
    /// Clients must present a username and password.
    UserPassword,
}

/// Authentication gate of one frontend.
///
/// Each frontend owns its own gate; two frontends never share one, even
/// when they point at the same credential file.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Option<Arc<dyn CredentialVerifier>>,
}

impl AuthGate {
    /// Gate that allows everyone.
    pub fn open() -> Self {
        Self { verifier: None }
    }

    /// Gate backed by an arbitrary verifier.
    pub fn new<V: CredentialVerifier + 'static>(verifier: V) -> Self {
        Self {
            verifier: Some(Arc::new(verifier)),
        }
    }

    /// Gate backed by a credential file, or open when `path` is `None`.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::new(CredentialStore::new(path)),
            None => Self::open(),
        }
    }

    #[inline]
    pub fn method(&self) -> AuthMethod {
        if self.verifier.is_some() {
            AuthMethod::UserPassword
        } else {
            AuthMethod::NoAuth
        }
    }

    #[inline]
    pub fn requires_auth(&self) -> bool {
        self.verifier.is_some()
    }

    /// Decide on a username/password pair.
    ///
    /// Any verifier error is a deny. An open gate allows without looking at
    /// the credentials.
    pub async fn evaluate(&self, username: &str, password: &str) -> AuthDecision {
        let Some(verifier) = &self.verifier else {
            return AuthDecision::allow(None);
        };
        match verifier.verify(username, password).await {
            Ok(result) => {
                AuthDecision::allow(Some(result.user_id.unwrap_or_else(|| username.to_string())))
            }
            Err(e) => {
                log_rejection(&e, Some(username));
                AuthDecision::deny(Some(username.to_string()))
            }
        }
    }

    /// Decide on an HTTP authorization header value.
    ///
    /// With auth configured, a missing or malformed value denies.
    pub async fn evaluate_basic(&self, header: Option<&str>) -> AuthDecision {
        if !self.requires_auth() {
            return AuthDecision::allow(None);
        }
        let Some(value) = header else {
            debug!("no credentials supplied");
            return AuthDecision::deny(None);
        };
        match parse_basic(value) {
            Ok(creds) => self.evaluate(&creds.username, &creds.password).await,
            Err(e) => {
                log_rejection(&e, None);
                AuthDecision::deny(None)
            }
        }
    }
}

fn log_rejection(err: &AuthError, username: Option<&str>) {
    if err.is_rejection() {
        debug!(user = ?username, error = %err, "credentials rejected");
    } else {
        warn!(user = ?username, error = %err, "credential check failed");
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::open()
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("method", &self.method())
            .finish()
    }
}
