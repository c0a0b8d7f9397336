//! # twinproxy
//!
//! A SOCKS5 and HTTP forward proxy gateway with htpasswd authentication.
//!
//! ## Crates
//!
//! - [`twinproxy_core`] - Shared types, connector, relay and audit events
//! - [`twinproxy_auth`] - Credential files and the authentication gate
//! - [`twinproxy_config`] - Configuration loading and validation
//! - [`twinproxy_socks`] - SOCKS5 frontend
//! - [`twinproxy_http`] - HTTP proxy frontend
//! - [`twinproxy_gateway`] - Gateway composing both frontends

pub use twinproxy_auth as auth;
pub use twinproxy_config as config;
pub use twinproxy_core as core;
pub use twinproxy_gateway as gateway;
pub use twinproxy_http as http;
pub use twinproxy_socks as socks;
