//! Per-connection settings shared by the frontends.

use std::time::Duration;

use crate::defaults::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_RELAY_BUFFER_SIZE};

/// Timeouts and buffer sizes applied to every proxied connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound for the handshake (greeting, authentication, request).
    /// `None` waits indefinitely.
    pub handshake_timeout: Option<Duration>,
    /// Close a tunnel when neither side transferred data for this long.
    pub idle_timeout: Duration,
    /// Relay buffer size per direction.
    pub relay_buffer_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: None,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            relay_buffer_size: DEFAULT_RELAY_BUFFER_SIZE,
        }
    }
}
