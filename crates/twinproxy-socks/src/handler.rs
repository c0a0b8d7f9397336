//! Per-connection SOCKS5 session.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, trace};
use twinproxy_auth::{AuthGate, AuthMethod};
use twinproxy_core::io::relay_bidirectional;
use twinproxy_core::{
    ConnectionEvent, Connector, EventSink, Protocol, SessionSettings, TargetAddr,
};

use crate::error::{Socks5Error, SocksError};
use crate::handshake::{
    self, CMD_CONNECT, REPLY_ADDRESS_TYPE_NOT_SUPPORTED, REPLY_COMMAND_NOT_SUPPORTED,
    REPLY_CONNECTION_NOT_ALLOWED, REPLY_CONNECTION_REFUSED, REPLY_GENERAL_FAILURE,
    REPLY_HOST_UNREACHABLE, REPLY_NETWORK_UNREACHABLE, REPLY_SUCCEEDED, REPLY_TTL_EXPIRED,
    send_auth_status, send_reply, send_reply_unspecified,
};

/// Lifecycle of one SOCKS5 connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connected,
    NegotiatingAuth,
    Authenticated,
    Rejected,
    Tunneling,
    Closed,
}

/// Collaborators shared by all connections of one frontend.
pub(crate) struct SessionContext {
    pub gate: AuthGate,
    pub connector: Arc<dyn Connector>,
    pub sink: Arc<dyn EventSink>,
    pub settings: SessionSettings,
}

struct Session<'a> {
    peer: SocketAddr,
    phase: SessionPhase,
    ctx: &'a SessionContext,
}

impl Session<'_> {
    fn advance(&mut self, next: SessionPhase) {
        trace!(peer = %self.peer, from = ?self.phase, to = ?next, "session phase");
        self.phase = next;
    }

    fn emit(&self, event: ConnectionEvent) {
        self.ctx.sink.emit(event);
    }
}

/// Handle a single SOCKS5 client connection.
pub(crate) async fn handle_socks5_conn(
    mut stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<SessionContext>,
) {
    let mut session = Session {
        peer,
        phase: SessionPhase::Connected,
        ctx: &ctx,
    };
    let result = run_session(&mut stream, &mut session).await;
    let phase = session.phase;
    session.advance(SessionPhase::Closed);
    match result {
        Ok(()) => debug!(peer = %peer, "connection closed"),
        Err(e) => debug!(
            peer = %peer,
            phase = ?phase,
            error_type = e.error_type(),
            error = %e,
            "connection closed with error"
        ),
    }
}

async fn run_session(stream: &mut TcpStream, session: &mut Session<'_>) -> Result<(), SocksError> {
    let limit = session.ctx.settings.handshake_timeout;
    let handshake = negotiate(stream, session);
    let request = match limit {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| SocksError::HandshakeTimeout)?,
        None => handshake.await,
    };

    let request = match request {
        Ok(req) => req,
        Err(SocksError::Socks5(Socks5Error::UnsupportedAddressType(atyp))) => {
            let _ = send_reply_unspecified(stream, REPLY_ADDRESS_TYPE_NOT_SUPPORTED).await;
            return Err(Socks5Error::UnsupportedAddressType(atyp).into());
        }
        Err(e) => return Err(e),
    };

    if request.command != CMD_CONNECT {
        let _ = send_reply_unspecified(stream, REPLY_COMMAND_NOT_SUPPORTED).await;
        return Err(Socks5Error::UnsupportedCommand(request.command).into());
    }

    handle_connect(stream, session, request.target).await
}

/// Greeting, authentication and request.
async fn negotiate(
    stream: &mut TcpStream,
    session: &mut Session<'_>,
) -> Result<handshake::Socks5Request, SocksError> {
    let ctx = session.ctx;
    let gate = &ctx.gate;
    session.advance(SessionPhase::NegotiatingAuth);

    if gate.method() == AuthMethod::UserPassword {
        // No 0x02 offer or a bad sub-negotiation version counts as a deny.
        let creds = match handshake::negotiate_method(stream, gate.method()).await {
            Ok(_) => handshake::read_credentials(stream).await,
            Err(e) => Err(e),
        };
        let creds = match creds {
            Ok(creds) => creds,
            Err(SocksError::Socks5(
                e @ (Socks5Error::NoAcceptableMethods | Socks5Error::InvalidAuthVersion(_)),
            )) => {
                reject(session, None);
                return Err(e.into());
            }
            Err(e) => return Err(e),
        };

        let decision = gate.evaluate(&creds.username, &creds.password).await;
        if !decision.allowed {
            reject(session, decision.identity);
            let _ = send_auth_status(stream, false).await;
            return Err(Socks5Error::AuthRejected.into());
        }
        send_auth_status(stream, true).await?;
        session.emit(ConnectionEvent::auth(
            Protocol::Socks,
            session.peer,
            decision.identity,
        ));
    } else {
        handshake::negotiate_method(stream, gate.method()).await?;
    }
    session.advance(SessionPhase::Authenticated);

    handshake::read_request(stream).await
}

fn reject(session: &mut Session<'_>, username: Option<String>) {
    session.advance(SessionPhase::Rejected);
    session.emit(ConnectionEvent::auth_fail(
        Protocol::Socks,
        session.peer,
        username,
    ));
}

/// Handle TCP CONNECT command.
async fn handle_connect(
    stream: &mut TcpStream,
    session: &mut Session<'_>,
    target: TargetAddr,
) -> Result<(), SocksError> {
    session.advance(SessionPhase::Tunneling);
    session.emit(ConnectionEvent::info(
        Protocol::Socks,
        session.peer,
        target.to_string(),
    ));

    let ctx = session.ctx;
    let outbound = match ctx.connector.connect(&target).await {
        Ok(s) => s,
        Err(e) => {
            let _ = send_reply_unspecified(stream, reply_code_for_connect_error(&e)).await;
            return Err(SocksError::Connect {
                target: target.to_string(),
                source: e,
            });
        }
    };

    let bind_addr = outbound
        .local_addr()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0u16)));
    send_reply(stream, REPLY_SUCCEEDED, &bind_addr).await?;

    let settings = &ctx.settings;
    let stats = relay_bidirectional(
        stream,
        outbound,
        settings.idle_timeout,
        settings.relay_buffer_size,
    )
    .await?;
    debug!(
        peer = %session.peer,
        target = %target,
        inbound = stats.inbound,
        outbound = stats.outbound,
        "tunnel finished"
    );
    Ok(())
}

fn reply_code_for_connect_error(error: &std::io::Error) -> u8 {
    match error.kind() {
        ErrorKind::ConnectionRefused => REPLY_CONNECTION_REFUSED,
        ErrorKind::NetworkUnreachable => REPLY_NETWORK_UNREACHABLE,
        ErrorKind::HostUnreachable => REPLY_HOST_UNREACHABLE,
        ErrorKind::PermissionDenied => REPLY_CONNECTION_NOT_ALLOWED,
        ErrorKind::TimedOut => REPLY_TTL_EXPIRED,
        ErrorKind::AddrNotAvailable | ErrorKind::NotFound => REPLY_HOST_UNREACHABLE,
        _ => REPLY_GENERAL_FAILURE,
    }
}
