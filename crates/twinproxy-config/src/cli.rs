//! CLI override definitions and application logic.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Enable or disable the SOCKS5 frontend
    #[arg(long)]
    pub socks: Option<bool>,
    /// Override SOCKS5 listen port
    #[arg(long)]
    pub socks_port: Option<u16>,
    /// Override SOCKS5 listen address, e.g. 127.0.0.1
    #[arg(long)]
    pub socks_address: Option<String>,
    /// SOCKS5 credential file (htpasswd format)
    #[arg(long)]
    pub socks_auth: Option<PathBuf>,
    /// Enable or disable the HTTP proxy frontend
    #[arg(long)]
    pub http: Option<bool>,
    /// Override HTTP proxy listen port
    #[arg(long)]
    pub http_port: Option<u16>,
    /// Override HTTP proxy listen address
    #[arg(long)]
    pub http_address: Option<String>,
    /// HTTP proxy credential file (htpasswd format)
    #[arg(long)]
    pub http_auth: Option<PathBuf>,
    /// Override outbound connect timeout (seconds)
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,
    /// Override tunnel idle timeout (seconds)
    #[arg(long)]
    pub idle_timeout_secs: Option<u64>,
    /// Bound the SOCKS5 handshake (seconds, 0 = no limit)
    #[arg(long)]
    pub handshake_timeout_secs: Option<u64>,
    /// Buffer size for TCP relay (bytes)
    #[arg(long)]
    pub relay_buffer_size: Option<usize>,
    /// TCP listener backlog size
    #[arg(long)]
    pub connection_backlog: Option<u32>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    let options = &mut config.options;
    if let Some(v) = overrides.socks {
        options.socks = v;
    }
    if let Some(v) = overrides.socks_port {
        options.socks_port = v;
    }
    if let Some(v) = &overrides.socks_address {
        options.socks_address = v.clone();
    }
    if let Some(v) = &overrides.socks_auth {
        options.socks_auth = Some(v.clone());
    }
    if let Some(v) = overrides.http {
        options.http = v;
    }
    if let Some(v) = overrides.http_port {
        options.http_port = v;
    }
    if let Some(v) = &overrides.http_address {
        options.http_address = v.clone();
    }
    if let Some(v) = &overrides.http_auth {
        options.http_auth = Some(v.clone());
    }

    let network = &mut config.network;
    if let Some(v) = overrides.connect_timeout_secs {
        network.connect_timeout_secs = v;
    }
    if let Some(v) = overrides.idle_timeout_secs {
        network.idle_timeout_secs = v;
    }
    // 0 clears the limit
    if let Some(v) = overrides.handshake_timeout_secs {
        network.handshake_timeout_secs = (v > 0).then_some(v);
    }
    if let Some(v) = overrides.relay_buffer_size {
        network.relay_buffer_size = v;
    }
    if let Some(v) = overrides.connection_backlog {
        network.connection_backlog = v;
    }

    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
