//! SOCKS5 listener and accept loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use twinproxy_auth::AuthGate;
use twinproxy_config::FrontendConfig;
use twinproxy_core::net::{create_listener, resolve_listen_addr};
use twinproxy_core::{
    ConnectionEvent, Connector, DEFAULT_CONNECTION_BACKLOG, DirectConnector, EventSink, Protocol,
    SessionSettings,
};

use crate::handler::{SessionContext, handle_socks5_conn};

/// Unbound SOCKS5 frontend.
///
/// Owns its own [`AuthGate`]; call [`bind`](Self::bind) to start listening.
pub struct SocksFrontend {
    gate: AuthGate,
    sink: Arc<dyn EventSink>,
    connector: Arc<dyn Connector>,
    settings: SessionSettings,
    backlog: u32,
}

impl SocksFrontend {
    pub fn new(gate: AuthGate, sink: Arc<dyn EventSink>) -> Self {
        Self {
            gate,
            sink,
            connector: Arc::new(DirectConnector::default()),
            settings: SessionSettings::default(),
            backlog: DEFAULT_CONNECTION_BACKLOG,
        }
    }

    /// Replace the outbound connector.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Bind the listener described by `config` and emit the START event.
    pub async fn bind(self, config: &FrontendConfig) -> io::Result<SocksServer> {
        let addr = resolve_listen_addr(&config.address, config.port).await?;
        let listener = create_listener(addr, self.backlog)?;
        let local_addr = listener.local_addr()?;

        self.sink
            .emit(ConnectionEvent::start(Protocol::Socks, local_addr));
        info!(listen = %local_addr, auth = ?self.gate.method(), "socks5 frontend started");

        Ok(SocksServer {
            listener,
            local_addr,
            ctx: Arc::new(SessionContext {
                gate: self.gate,
                connector: self.connector,
                sink: self.sink,
                settings: self.settings,
            }),
        })
    }
}

/// Bound SOCKS5 frontend.
pub struct SocksServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<SessionContext>,
}

impl SocksServer {
    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// In-flight sessions keep running after the accept loop stops.
    pub async fn serve(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let _ = stream.set_nodelay(true);
                            debug!(peer = %peer, "new connection");
                            let ctx = self.ctx.clone();
                            tokio::spawn(handle_socks5_conn(stream, peer, ctx));
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    info!(listen = %self.local_addr, "socks5 frontend stopped");
                    break;
                }
            }
        }
    }
}
