//! Destination addresses requested by proxy clients.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// A destination requested through SOCKS5 or HTTP CONNECT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetAddr {
    /// Literal IP address and port.
    Ip(SocketAddr),
    /// Host name and port, resolved when connecting.
    Domain(String, u16),
}

impl TargetAddr {
    /// Destination port.
    #[inline]
    pub fn port(&self) -> u16 {
        match self {
            Self::Ip(addr) => addr.port(),
            Self::Domain(_, port) => *port,
        }
    }

    /// Host portion, without the port.
    pub fn host(&self) -> String {
        match self {
            Self::Ip(addr) => addr.ip().to_string(),
            Self::Domain(host, _) => host.clone(),
        }
    }

    /// Build a target from a host and port, recognising IP literals.
    pub fn from_host_port(host: &str, port: u16) -> Self {
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        match bare.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(SocketAddr::new(ip, port)),
            Err(_) => Self::Domain(bare.to_string(), port),
        }
    }

    /// Parse an authority of the form `host:port` or `[v6]:port`.
    ///
    /// Returns `None` when the port is missing or invalid, or the host is empty.
    pub fn parse_authority(authority: &str) -> Option<Self> {
        if let Ok(addr) = authority.parse::<SocketAddr>() {
            return Some(Self::Ip(addr));
        }
        let (host, port) = authority.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some(Self::from_host_port(host, port))
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        Self::Ip(addr)
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(addr) => write!(f, "{addr}"),
            Self::Domain(host, port) => write!(f, "{host}:{port}"),
        }
    }
}
