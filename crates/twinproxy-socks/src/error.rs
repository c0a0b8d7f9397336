//! SOCKS5 frontend error types.

use std::fmt;

use twinproxy_core::{ERROR_AUTH, ERROR_IO, ERROR_PROTOCOL, ERROR_TIMEOUT, ERROR_UPSTREAM};

/// Errors that end a SOCKS5 session.
#[derive(Debug, thiserror::Error)]
pub enum SocksError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("socks5: {0}")]
    Socks5(Socks5Error),

    #[error("handshake timed out")]
    HandshakeTimeout,

    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },
}

impl SocksError {
    /// Error kind label for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => ERROR_IO,
            Self::Socks5(Socks5Error::AuthRejected) => ERROR_AUTH,
            Self::Socks5(_) => ERROR_PROTOCOL,
            Self::HandshakeTimeout => ERROR_TIMEOUT,
            Self::Connect { .. } => ERROR_UPSTREAM,
        }
    }
}

/// SOCKS5 protocol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Socks5Error {
    InvalidVersion(u8),
    NoAcceptableMethods,
    InvalidAuthVersion(u8),
    AuthRejected,
    UnsupportedCommand(u8),
    UnsupportedAddressType(u8),
    InvalidDomain,
    Truncated,
}

impl fmt::Display for Socks5Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVersion(v) => write!(f, "invalid SOCKS version: 0x{v:02x}"),
            Self::NoAcceptableMethods => write!(f, "no acceptable authentication methods"),
            Self::InvalidAuthVersion(v) => {
                write!(f, "invalid username/password auth version: 0x{v:02x}")
            }
            Self::AuthRejected => write!(f, "authentication rejected"),
            Self::UnsupportedCommand(c) => write!(f, "unsupported command: 0x{c:02x}"),
            Self::UnsupportedAddressType(a) => write!(f, "unsupported address type: 0x{a:02x}"),
            Self::InvalidDomain => write!(f, "invalid domain name"),
            Self::Truncated => write!(f, "connection closed mid-message"),
        }
    }
}

impl std::error::Error for Socks5Error {}

impl From<Socks5Error> for SocksError {
    fn from(e: Socks5Error) -> Self {
        Self::Socks5(e)
    }
}
