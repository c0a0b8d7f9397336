//! Outbound connection establishment.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::defaults::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::target::TargetAddr;

/// Opens the outbound leg of a tunnel.
///
/// Frontends only call this after the authentication decision allowed the
/// connection, so an implementation observes exactly the accepted targets.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `target`.
    async fn connect(&self, target: &TargetAddr) -> io::Result<TcpStream>;
}

#[async_trait]
impl<C: Connector + ?Sized> Connector for Arc<C> {
    #[inline]
    async fn connect(&self, target: &TargetAddr) -> io::Result<TcpStream> {
        (**self).connect(target).await
    }
}

/// Connects straight to the destination over TCP.
#[derive(Debug, Clone)]
pub struct DirectConnector {
    connect_timeout: Duration,
    no_delay: bool,
}

impl DirectConnector {
    /// Create a connector with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            no_delay: true,
        }
    }

    /// Toggle `TCP_NODELAY` on outbound sockets.
    pub fn with_no_delay(mut self, no_delay: bool) -> Self {
        self.no_delay = no_delay;
        self
    }
}

impl Default for DirectConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Connector for DirectConnector {
    async fn connect(&self, target: &TargetAddr) -> io::Result<TcpStream> {
        let connect = async {
            match target {
                TargetAddr::Ip(addr) => TcpStream::connect(addr).await,
                TargetAddr::Domain(host, port) => TcpStream::connect((host.as_str(), *port)).await,
            }
        };
        let stream = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;
        if self.no_delay {
            stream.set_nodelay(true)?;
        }
        debug!(target = %target, "outbound connected");
        Ok(stream)
    }
}
