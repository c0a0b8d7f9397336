//! SOCKS5 frontend.
//!
//! Implements the server side of RFC 1928 (CONNECT only) with optional
//! RFC 1929 username/password authentication. Every session runs through
//! `Connected → NegotiatingAuth → (Authenticated | Rejected) →
//! (Tunneling | Closed)`; the outbound connector is only reached from
//! `Authenticated`.

mod error;
mod handler;
pub mod handshake;
mod server;

pub use error::{Socks5Error, SocksError};
pub use handler::SessionPhase;
pub use server::{SocksFrontend, SocksServer};
