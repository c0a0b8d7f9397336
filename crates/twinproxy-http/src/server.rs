//! HTTP proxy listener and accept loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use twinproxy_auth::AuthGate;
use twinproxy_config::FrontendConfig;
use twinproxy_core::net::{create_listener, resolve_listen_addr};
use twinproxy_core::{
    ConnectionEvent, Connector, DEFAULT_CONNECTION_BACKLOG, DirectConnector, EventSink, Protocol,
    SessionSettings,
};

use crate::service::{ProxyContext, proxy};

/// Unbound HTTP proxy frontend.
pub struct HttpFrontend {
    gate: AuthGate,
    sink: Arc<dyn EventSink>,
    connector: Arc<dyn Connector>,
    settings: SessionSettings,
    backlog: u32,
}

impl HttpFrontend {
    pub fn new(gate: AuthGate, sink: Arc<dyn EventSink>) -> Self {
        Self {
            gate,
            sink,
            connector: Arc::new(DirectConnector::default()),
            settings: SessionSettings::default(),
            backlog: DEFAULT_CONNECTION_BACKLOG,
        }
    }

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
    pub async fn bind(self, config: &FrontendConfig) -> io::Result<HttpServer> {
        let addr = resolve_listen_addr(&config.address, config.port).await?;
        let listener = create_listener(addr, self.backlog)?;
        let local_addr = listener.local_addr()?;

        self.sink
            .emit(ConnectionEvent::start(Protocol::Http, local_addr));
        info!(listen = %local_addr, auth = ?self.gate.method(), "http frontend started");

        Ok(HttpServer {
            listener,
            local_addr,
            ctx: Arc::new(ProxyContext {
                gate: self.gate,
                connector: self.connector,
                sink: self.sink,
                settings: self.settings,
            }),
        })
    }
}

/// Bound HTTP proxy frontend.
pub struct HttpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<ProxyContext>,
}

impl HttpServer {
    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let _ = stream.set_nodelay(true);
                            debug!(peer = %peer, "new connection");
                            tokio::spawn(serve_connection(stream, peer, self.ctx.clone()));
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    info!(listen = %self.local_addr, "http frontend stopped");
                    break;
                }
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, ctx: Arc<ProxyContext>) {
    let service = service_fn(move |req| proxy(req, peer, ctx.clone()));
    if let Err(e) = http1::Builder::new()
        .preserve_header_case(true)
        .title_case_headers(true)
        .serve_connection(TokioIo::new(stream), service)
        .with_upgrades()
        .await
    {
        debug!(peer = %peer, error = %e, "http connection error");
    }
}
