//! HTTP Basic credentials (RFC 7617).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AuthError;

/// Username and password carried by a Basic token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse a `Basic <base64(user:pass)>` header value.
///
/// The scheme is matched case-insensitively. The decoded token is split on
/// the first `:`, so passwords may contain colons.
pub fn parse_basic(value: &str) -> Result<BasicCredentials, AuthError> {
    let value = value.trim();
    let (scheme, token) = value
        .split_once(char::is_whitespace)
        .ok_or(AuthError::MalformedHeader("missing token"))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedHeader("unsupported scheme"));
    }
    let decoded = STANDARD
        .decode(token.trim())
        .map_err(|_| AuthError::MalformedHeader("invalid base64"))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader("invalid utf-8"))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedHeader("missing ':' separator"))?;
    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Build a `Basic` header value.
pub fn encode_basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
