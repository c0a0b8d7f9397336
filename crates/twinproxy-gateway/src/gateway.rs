//! Composition of the two frontends.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use twinproxy_auth::{AuthGate, CredentialStore, EnsureOutcome};
use twinproxy_config::{Config, FrontendConfig};
use twinproxy_core::{
    ConnectionEvent, ConnectionLogger, Connector, DirectConnector, EventSink, Protocol,
};
use twinproxy_http::HttpFrontend;
use twinproxy_socks::SocksFrontend;

use crate::error::GatewayError;

/// Owns the configuration and starts every enabled frontend.
///
/// Each frontend gets its own [`AuthGate`], even when both point at the
/// same credential file.
pub struct Gateway {
    config: Config,
    sink: Arc<dyn EventSink>,
    connector: Option<Arc<dyn Connector>>,
}

impl Gateway {
    /// Gateway writing audit lines to stdout.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sink: Arc::new(ConnectionLogger::stdout()),
            connector: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the outbound connector of both frontends.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind every enabled frontend and spawn its accept loop.
    ///
    /// A frontend that fails to bind is logged and skipped; the call only
    /// fails when none is left running.
    pub async fn start(self, shutdown: CancellationToken) -> Result<RunningGateway, GatewayError> {
        let connector = self.connector.clone().unwrap_or_else(|| {
            Arc::new(DirectConnector::new(self.config.connect_timeout())) as Arc<dyn Connector>
        });
        let settings = self.config.session_settings();
        let backlog = self.config.network.connection_backlog;

        let mut running = RunningGateway {
            socks_addr: None,
            http_addr: None,
            tasks: Vec::new(),
        };

        if let Some(frontend) = self.config.socks_frontend() {
            let gate = self.prepare(Protocol::Socks, &frontend).await;
            let bound = SocksFrontend::new(gate, self.sink.clone())
                .with_connector(connector.clone())
                .with_settings(settings)
                .with_backlog(backlog)
                .bind(&frontend)
                .await;
            match bound {
                Ok(server) => {
                    running.socks_addr = Some(server.local_addr());
                    running.tasks.push(tokio::spawn(server.serve(shutdown.clone())));
                }
                Err(source) => log_bind_failure(Protocol::Socks, &frontend, source),
            }
        }

        if let Some(frontend) = self.config.http_frontend() {
            let gate = self.prepare(Protocol::Http, &frontend).await;
            let bound = HttpFrontend::new(gate, self.sink.clone())
                .with_connector(connector.clone())
                .with_settings(settings)
                .with_backlog(backlog)
                .bind(&frontend)
                .await;
            match bound {
                Ok(server) => {
                    running.http_addr = Some(server.local_addr());
                    running.tasks.push(tokio::spawn(server.serve(shutdown.clone())));
                }
                Err(source) => log_bind_failure(Protocol::Http, &frontend, source),
            }
        }

        if running.tasks.is_empty() {
            return Err(GatewayError::NoFrontends);
        }
        Ok(running)
    }

    /// Start the frontends and wait until they stop.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), GatewayError> {
        let running = self.start(shutdown).await?;
        running.wait().await;
        Ok(())
    }

    /// CONFIG event, credential file creation and gate for one frontend.
    async fn prepare(&self, protocol: Protocol, frontend: &FrontendConfig) -> AuthGate {
        let settings = serde_json::to_string(frontend).unwrap_or_else(|_| format!("{frontend:?}"));
        self.sink.emit(ConnectionEvent::config(protocol, settings));

        match CredentialStore::ensure_exists(frontend.auth.as_deref()).await {
            Ok(EnsureOutcome::Created) => {
                info!(protocol = protocol.label(), path = ?frontend.auth, "created empty credential file");
            }
            Ok(EnsureOutcome::Existing | EnsureOutcome::Skipped) => {}
            Err(e) => {
                error!(protocol = protocol.label(), path = ?frontend.auth, error = %e, "cannot create credential file");
            }
        }

        AuthGate::from_path(frontend.auth.clone())
    }
}

fn log_bind_failure(protocol: Protocol, frontend: &FrontendConfig, source: std::io::Error) {
    let err = GatewayError::Bind {
        protocol: protocol.label(),
        source,
    };
    error!(
        address = %frontend.address,
        port = frontend.port,
        error = %err,
        "frontend not started"
    );
}

/// Handle to the started frontends.
pub struct RunningGateway {
    socks_addr: Option<SocketAddr>,
    http_addr: Option<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningGateway {
    /// Bound address of the SOCKS5 frontend, if it is running.
    #[inline]
    pub fn socks_addr(&self) -> Option<SocketAddr> {
        self.socks_addr
    }

    /// Bound address of the HTTP frontend, if it is running.
    #[inline]
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Wait for every accept loop to finish.
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "frontend task ended abnormally");
            }
        }
    }
}
