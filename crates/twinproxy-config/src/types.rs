//! Configuration type definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use twinproxy_core::SessionSettings;

use crate::defaults::*;

/// Full gateway configuration.
///
/// The frontend options sit at the top level of the file under their
/// camel-cased names; tuning and logging live in their own tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub options: GatewayOptions,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The recognised frontend options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayOptions {
    /// Enable the SOCKS5 frontend.
    pub socks: bool,
    pub socks_port: u16,
    pub socks_address: String,
    /// Credential file for the SOCKS5 frontend. Unset means no auth.
    pub socks_auth: Option<PathBuf>,
    /// Enable the HTTP proxy frontend.
    pub http: bool,
    pub http_port: u16,
    pub http_address: String,
    /// Credential file for the HTTP frontend. Unset means no auth.
    pub http_auth: Option<PathBuf>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            socks: false,
            socks_port: default_socks_port(),
            socks_address: default_listen_address(),
            socks_auth: None,
            http: false,
            http_port: default_http_port(),
            http_address: default_listen_address(),
            http_auth: None,
        }
    }
}

/// Settings of one frontend, fixed once it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    pub port: u16,
    pub address: String,
    pub auth: Option<PathBuf>,
}

/// Network tuning shared by both frontends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Outbound connect timeout (seconds).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Tunnel idle timeout (seconds).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Bound on the SOCKS5 greeting, auth and request. Unset waits forever.
    #[serde(default)]
    pub handshake_timeout_secs: Option<u64>,
    /// Buffer size for TCP relay (bytes).
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,
    /// TCP listener backlog (pending connections queue size).
    #[serde(default = "default_connection_backlog")]
    pub connection_backlog: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            handshake_timeout_secs: None,
            relay_buffer_size: default_relay_buffer_size(),
            connection_backlog: default_connection_backlog(),
        }
    }
}

/// Diagnostic logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"twinproxy_auth": "debug"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Config {
    /// SOCKS5 frontend settings, if enabled.
    pub fn socks_frontend(&self) -> Option<FrontendConfig> {
        let o = &self.options;
        o.socks.then(|| FrontendConfig {
            port: o.socks_port,
            address: o.socks_address.clone(),
            auth: o.socks_auth.clone(),
        })
    }

    /// HTTP frontend settings, if enabled.
    pub fn http_frontend(&self) -> Option<FrontendConfig> {
        let o = &self.options;
        o.http.then(|| FrontendConfig {
            port: o.http_port,
            address: o.http_address.clone(),
            auth: o.http_auth.clone(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout_secs)
    }

    /// Per-connection settings derived from `[network]`.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            handshake_timeout: self.network.handshake_timeout_secs.map(Duration::from_secs),
            idle_timeout: Duration::from_secs(self.network.idle_timeout_secs),
            relay_buffer_size: self.network.relay_buffer_size,
        }
    }
}
