//! I/O utilities for tunnelling accepted connections.

mod relay;

pub use relay::{RelayStats, relay_bidirectional};
