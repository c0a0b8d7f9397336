//! Error kind labels for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Protocol parsing/validation error.
pub const ERROR_PROTOCOL: &str = "protocol";
/// I/O error.
pub const ERROR_IO: &str = "io";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Authentication error.
pub const ERROR_AUTH: &str = "auth";
/// Upstream (destination) error.
pub const ERROR_UPSTREAM: &str = "upstream";
