//! Core types and helpers shared across twinproxy crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error kind labels for logging
//! - Target addresses and the outbound [`Connector`] seam
//! - Listener creation and the bidirectional relay
//! - The connection-audit event stream ([`ConnectionEvent`], [`EventSink`])

pub mod connect;
pub mod defaults;
pub mod errors;
pub mod event;
pub mod io;
pub mod net;
pub mod session;
pub mod target;

pub use connect::{Connector, DirectConnector};
pub use defaults::*;
pub use errors::*;
pub use event::{ConnectionEvent, ConnectionLogger, EventKind, EventSink, MemorySink, Phase, Protocol};
pub use session::SessionSettings;
pub use target::TargetAddr;

/// Project name.
pub const PROJECT_NAME: &str = "twinproxy";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
