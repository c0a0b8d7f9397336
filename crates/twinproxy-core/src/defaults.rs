//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Listener Defaults
// ============================================================================

/// Default SOCKS5 listen port.
pub const DEFAULT_SOCKS_PORT: u16 = 1080;
/// Default HTTP proxy listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default listen address for both frontends.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
/// Default TCP listener backlog.
pub const DEFAULT_CONNECTION_BACKLOG: u32 = 1024;

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default outbound connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default tunnel idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Buffer/Size Defaults
// ============================================================================

/// Default relay buffer size (32 KiB).
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 32768;
/// Smallest accepted relay buffer size.
pub const MIN_RELAY_BUFFER_SIZE: usize = 1024;
/// Largest accepted relay buffer size (1 MiB).
pub const MAX_RELAY_BUFFER_SIZE: usize = 1024 * 1024;

// ============================================================================
// Auth Defaults
// ============================================================================

/// Realm advertised in `Proxy-Authenticate` challenges.
pub const DEFAULT_PROXY_REALM: &str = "twinproxy";
/// Default bcrypt cost for newly added credentials.
pub const DEFAULT_BCRYPT_COST: u32 = 10;
