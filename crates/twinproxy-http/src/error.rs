//! HTTP frontend error types.

use twinproxy_core::{ERROR_IO, ERROR_PROTOCOL, ERROR_UPSTREAM};

/// Errors raised while serving one proxied request or tunnel.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },
}

impl HttpError {
    /// Error kind label for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => ERROR_IO,
            Self::Hyper(_) | Self::BadRequest(_) => ERROR_PROTOCOL,
            Self::Connect { .. } => ERROR_UPSTREAM,
        }
    }
}
