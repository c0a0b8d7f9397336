//! Connection-audit events.
//!
//! Every lifecycle step of a frontend (configuration dump, listener start,
//! authentication outcome, tunnel endpoints) is reported as a
//! [`ConnectionEvent`] to an [`EventSink`]. The production sink,
//! [`ConnectionLogger`], writes one line per event:
//!
//! ```text
//! [2026-10-14 12:00:00][Socks Proxy Info] 10.0.0.2:5555 <===> example.com:443
//! ```

use std::fmt;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Which frontend produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Socks,
    Http,
}

impl Protocol {
    /// Label used in audit lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Socks => "Socks Proxy",
            Self::Http => "HTTP Proxy",
        }
    }

    fn server_name(self) -> &'static str {
        match self {
            Self::Socks => "SOCKS",
            Self::Http => "HTTP",
        }
    }
}

/// Lifecycle phase of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Config,
    Start,
    Auth,
    Info,
    AuthFail,
}

impl Phase {
    /// Label used in audit lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Config => "Config",
            Self::Start => "Start",
            Self::Auth => "Auth",
            Self::Info => "Info",
            Self::AuthFail => "Auth Fail",
        }
    }
}

/// Phase-specific payload of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Effective frontend configuration, serialized on one line.
    Config { settings: String },
    /// Listener bound.
    Start { listen: SocketAddr },
    /// Credentials accepted.
    Auth {
        source: SocketAddr,
        identity: Option<String>,
    },
    /// Request or tunnel between a client and a destination.
    Info {
        source: SocketAddr,
        destination: String,
    },
    /// Credentials rejected or missing.
    AuthFail {
        source: SocketAddr,
        username: Option<String>,
    },
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    /// Creation time (UTC).
    pub timestamp: OffsetDateTime,
    pub protocol: Protocol,
    pub kind: EventKind,
}

impl ConnectionEvent {
    /// Create an event stamped with the current time.
    pub fn new(protocol: Protocol, kind: EventKind) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            protocol,
            kind,
        }
    }

    pub fn config(protocol: Protocol, settings: impl Into<String>) -> Self {
        Self::new(
            protocol,
            EventKind::Config {
                settings: settings.into(),
            },
        )
    }

    pub fn start(protocol: Protocol, listen: SocketAddr) -> Self {
        Self::new(protocol, EventKind::Start { listen })
    }

    pub fn auth(protocol: Protocol, source: SocketAddr, identity: Option<String>) -> Self {
        Self::new(protocol, EventKind::Auth { source, identity })
    }

    pub fn info(protocol: Protocol, source: SocketAddr, destination: impl Into<String>) -> Self {
        Self::new(
            protocol,
            EventKind::Info {
                source,
                destination: destination.into(),
            },
        )
    }

    pub fn auth_fail(protocol: Protocol, source: SocketAddr, username: Option<String>) -> Self {
        Self::new(protocol, EventKind::AuthFail { source, username })
    }

    /// Phase of this event.
    pub fn phase(&self) -> Phase {
        match self.kind {
            EventKind::Config { .. } => Phase::Config,
            EventKind::Start { .. } => Phase::Start,
            EventKind::Auth { .. } => Phase::Auth,
            EventKind::Info { .. } => Phase::Info,
            EventKind::AuthFail { .. } => Phase::AuthFail,
        }
    }

    /// Client address, for per-connection events.
    pub fn source(&self) -> Option<SocketAddr> {
        match &self.kind {
            EventKind::Auth { source, .. }
            | EventKind::Info { source, .. }
            | EventKind::AuthFail { source, .. } => Some(*source),
            EventKind::Config { .. } | EventKind::Start { .. } => None,
        }
    }

    /// Message part of the audit line.
    pub fn message(&self) -> String {
        match &self.kind {
            EventKind::Config { settings } => settings.clone(),
            EventKind::Start { listen } => format!(
                "{} server listening on host {listen}",
                self.protocol.server_name()
            ),
            EventKind::Auth {
                source,
                identity: Some(user),
            } => format!("Auth from host {source} as {user}"),
            EventKind::Auth {
                source,
                identity: None,
            } => format!("Auth from host {source}"),
            EventKind::Info {
                source,
                destination,
            } => format!("{source} <===> {destination}"),
            EventKind::AuthFail {
                source,
                username: Some(user),
            } => format!("Auth fail with username {user} from host {source}."),
            EventKind::AuthFail {
                source,
                username: None,
            } => format!("Auth fail from host {source}, no credentials supplied."),
        }
    }

    /// Render the full audit line with the timestamp shown in `offset`.
    pub fn render(&self, offset: UtcOffset) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let stamp = self
            .timestamp
            .to_offset(offset)
            .format(format)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string());
        format!(
            "[{stamp}][{} {}] {}",
            self.protocol.label(),
            self.phase().label(),
            self.message()
        )
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(UtcOffset::UTC))
    }
}

/// Destination for audit events.
///
/// Implementations must not fail the caller: a sink that cannot record an
/// event reports the problem itself and returns.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ConnectionEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    #[inline]
    fn emit(&self, event: ConnectionEvent) {
        (**self).emit(event)
    }
}

/// Process-wide audit logger writing one line per event.
///
/// Lines go to stdout unless another writer is supplied. There is no
/// buffering or rotation; write failures are reported on stderr.
pub struct ConnectionLogger {
    out: Mutex<Box<dyn Write + Send>>,
    offset: UtcOffset,
}

impl ConnectionLogger {
    /// Logger writing to stdout with the local UTC offset.
    ///
    /// The offset is captured once; construct the logger before spawning
    /// worker threads so the local offset can be determined.
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Logger writing to an arbitrary writer.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    /// Override the offset used for timestamps.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }
}

impl fmt::Debug for ConnectionLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLogger")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl EventSink for ConnectionLogger {
    fn emit(&self, event: ConnectionEvent) {
        let line = event.render(self.offset);
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            eprintln!("audit log write failed: {e}");
        }
    }
}

/// Sink that keeps events in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ConnectionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in emission order.
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events in `phase`.
    pub fn count(&self, phase: Phase) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.phase() == phase)
            .count()
    }

    /// Recorded events of `protocol` in `phase`.
    pub fn of(&self, protocol: Protocol, phase: Phase) -> Vec<ConnectionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.protocol == protocol && e.phase() == phase)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ConnectionEvent) {
        self.events.lock().push(event);
    }
}
