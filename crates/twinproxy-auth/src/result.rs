//! Authentication result types.

/// Result of a successful credential check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResult {
    /// Authenticated username, when the check involved one.
    pub user_id: Option<String>,
}

impl AuthResult {
    /// Result with no user identity.
    #[inline]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Result for a named user.
    #[inline]
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// Accept/deny outcome for one SOCKS connection or one HTTP request.
///
/// Produced once by the gate and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    /// Whether the connection may proceed.
    pub allowed: bool,
    /// Attempted or authenticated username, when one was supplied.
    pub identity: Option<String>,
}

impl AuthDecision {
    #[inline]
    pub fn allow(identity: Option<String>) -> Self {
        Self {
            allowed: true,
            identity,
        }
    }

    #[inline]
    pub fn deny(identity: Option<String>) -> Self {
        Self {
            allowed: false,
            identity,
        }
    }
}
