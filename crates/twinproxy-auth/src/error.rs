//! Authentication error types.

use std::io;

/// Authentication error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong password for a known user.
    #[error("invalid credential")]
    Invalid,

    /// No entry for the username.
    #[error("user not found")]
    NotFound,

    /// Authorization header present but unusable.
    #[error("malformed credential header: {0}")]
    MalformedHeader(&'static str),

    /// Credential source could not be consulted.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error while managing the credential file.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl AuthError {
    /// Create a backend error from any error type.
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    /// Whether the error reflects the supplied credentials rather than
    /// the credential source.
    #[inline]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Invalid | Self::NotFound | Self::MalformedHeader(_)
        )
    }
}
