//! Integration tests for the HTTP proxy frontend.
//!
//! A raw TCP client talks to a bound frontend so the exact wire behavior
//! (status line, challenge header, tunnel bytes) is visible.
#![allow(clippy::tests_outside_test_module)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use twinproxy_auth::{AuthGate, encode_basic};
use twinproxy_config::FrontendConfig;
use twinproxy_core::{Connector, DirectConnector, MemorySink, Phase, Protocol, TargetAddr};
use twinproxy_http::HttpFrontend;

// ============================================================================
// Test Helpers
// ============================================================================

/// Origin server answering every request with its own request head as body.
struct MockOrigin {
    addr: SocketAddr,
    _handle: thread::JoinHandle<()>,
}

impl MockOrigin {
    fn start() -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                thread::spawn(move || {
                    let mut pending = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        while let Some(end) = find_head_end(&pending) {
                            let head: Vec<u8> = pending.drain(..end).collect();
                            let reply = format!(
                                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n",
                                head.len()
                            );
                            if stream.write_all(reply.as_bytes()).is_err()
                                || stream.write_all(&head).is_err()
                            {
                                return;
                            }
                        }
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => return,
                            Ok(n) => pending.extend_from_slice(&buf[..n]),
                        }
                    }
                });
            }
        });

        Self {
            addr,
            _handle: handle,
        }
    }
}

/// A simple TCP server that echoes back whatever it receives.
struct MockEchoServer {
    addr: SocketAddr,
    _handle: thread::JoinHandle<()>,
}

impl MockEchoServer {
    fn start() -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                thread::spawn(move || {
                    let mut buf = [0u8; 4096];
                    loop {
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if stream.write_all(&buf[..n]).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            _handle: handle,
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

#[derive(Default)]
struct CountingConnector {
    calls: AtomicUsize,
    inner: DirectConnector,
}

impl CountingConnector {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self, target: &TargetAddr) -> std::io::Result<TcpStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(target).await
    }
}

struct Harness {
    addr: SocketAddr,
    sink: Arc<MemorySink>,
    connector: Arc<CountingConnector>,
    shutdown: CancellationToken,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn start_frontend(auth: Option<PathBuf>) -> Harness {
    let sink = Arc::new(MemorySink::new());
    let connector = Arc::new(CountingConnector::default());
    let config = FrontendConfig {
        port: 0,
        address: "127.0.0.1".into(),
        auth: auth.clone(),
    };
    let server = HttpFrontend::new(AuthGate::from_path(auth), sink.clone())
        .with_connector(connector.clone())
        .bind(&config)
        .await
        .unwrap();
    let addr = server.local_addr();
    let shutdown = CancellationToken::new();
    tokio::spawn(server.serve(shutdown.clone()));
    Harness {
        addr,
        sink,
        connector,
        shutdown,
    }
}

fn creds_file(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creds.txt");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

struct RawResponse {
    head: String,
    body: Vec<u8>,
}

impl RawResponse {
    fn status(&self) -> u16 {
        self.head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Reads one response head byte by byte so no tunnel data is consumed.
async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while find_head_end(&head).is_none() {
        tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut byte))
            .await
            .expect("read timed out")
            .unwrap();
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

async fn read_response(stream: &mut TcpStream) -> RawResponse {
    let head = read_head(stream).await;
    let mut resp = RawResponse {
        head,
        body: Vec::new(),
    };
    let len: usize = resp
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut body))
        .await
        .expect("read timed out")
        .unwrap();
    resp.body = body;
    resp
}

async fn send(stream: &mut TcpStream, request: String) -> RawResponse {
    stream.write_all(request.as_bytes()).await.unwrap();
    read_response(stream).await
}

fn get(target: SocketAddr, path: &str, extra: &str) -> String {
    format!("GET http://{target}{path} HTTP/1.1\r\nHost: {target}\r\n{extra}\r\n")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn no_auth_forwards_in_origin_form() {
    let origin = MockOrigin::start();
    let h = start_frontend(None).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/hello?x=1", "")).await;

    assert_eq!(resp.status(), 200);
    assert!(resp.body_text().starts_with("GET /hello?x=1 HTTP/1.1\r\n"));
    assert_eq!(h.connector.calls(), 1);

    let info = h.sink.of(Protocol::Http, Phase::Info);
    assert_eq!(info.len(), 1);
    assert!(info[0].message().ends_with(&format!("<===> {}", origin.addr)));
    assert_eq!(h.sink.count(Phase::Auth), 0);
}

#[tokio::test]
async fn valid_proxy_authorization_is_accepted_and_stripped() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let header = format!(
        "Proxy-Authorization: {}\r\n",
        encode_basic("alice", "wonderland")
    );
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", &header)).await;

    assert_eq!(resp.status(), 200);
    assert!(!resp.body_text().to_ascii_lowercase().contains("proxy-authorization"));
    let auth = h.sink.of(Protocol::Http, Phase::Auth);
    assert_eq!(auth.len(), 1);
    assert!(auth[0].message().contains("alice"));
}

#[tokio::test]
async fn bad_credentials_get_407_without_upstream() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let header = format!("Proxy-Authorization: {}\r\n", encode_basic("bob", "bad"));
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", &header)).await;

    assert_eq!(resp.status(), 407);
    assert_eq!(
        resp.header("proxy-authenticate"),
        Some("Basic realm=\"twinproxy\"")
    );
    assert_eq!(h.connector.calls(), 0);

    let fails = h.sink.of(Protocol::Http, Phase::AuthFail);
    assert_eq!(fails.len(), 1);
    assert!(fails[0].message().contains("bob"));
}

#[tokio::test]
async fn missing_credentials_get_407() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", "")).await;

    assert_eq!(resp.status(), 407);
    assert_eq!(h.connector.calls(), 0);
    assert_eq!(h.sink.count(Phase::AuthFail), 1);
}

#[tokio::test]
async fn authorization_header_is_a_fallback() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let header = format!("Authorization: {}\r\n", encode_basic("alice", "wonderland"));
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", &header)).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(h.connector.calls(), 1);
    assert!(!resp.body_text().to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn authorization_reaches_origin_without_proxy_auth() {
    let origin = MockOrigin::start();
    let h = start_frontend(None).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(
        &mut client,
        get(origin.addr, "/", "Authorization: Bearer origin-token\r\n"),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert!(resp.body_text().contains("Bearer origin-token"));
}

#[tokio::test]
async fn hop_by_hop_headers_are_not_forwarded() {
    let origin = MockOrigin::start();
    let h = start_frontend(None).await;

    let extra = "Keep-Alive: timeout=5\r\nTE: trailers\r\n\
                 Connection: keep-alive, X-Secret\r\nX-Secret: drop-me\r\n\
                 X-Kept: yes\r\n";
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", extra)).await;

    assert_eq!(resp.status(), 200);
    let seen = resp.body_text().to_ascii_lowercase();
    assert!(!seen.contains("keep-alive: timeout=5"));
    assert!(!seen.contains("te: trailers"));
    assert!(!seen.contains("x-secret"));
    assert!(seen.contains("x-kept: yes"));
}

#[tokio::test]
async fn disconnect_mid_request_leaves_frontend_serving() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let mut dropped = TcpStream::connect(h.addr).await.unwrap();
    let partial = format!("GET http://{}/ HTTP/1.1\r\nHost: {}\r\nProxy-Author", origin.addr, origin.addr);
    dropped.write_all(partial.as_bytes()).await.unwrap();
    drop(dropped);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sink.count(Phase::Info), 0);
    assert_eq!(h.connector.calls(), 0);

    let header = format!(
        "Proxy-Authorization: {}\r\n",
        encode_basic("alice", "wonderland")
    );
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(origin.addr, "/", &header)).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(h.sink.count(Phase::Info), 1);
    assert_eq!(h.sink.count(Phase::Auth), 1);
    assert_eq!(h.connector.calls(), 1);
}

#[tokio::test]
async fn each_keep_alive_request_is_evaluated() {
    let origin = MockOrigin::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let header = format!(
        "Proxy-Authorization: {}\r\n",
        encode_basic("alice", "wonderland")
    );
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let first = send(&mut client, get(origin.addr, "/one", &header)).await;
    assert_eq!(first.status(), 200);

    let second = send(&mut client, get(origin.addr, "/two", "")).await;
    assert_eq!(second.status(), 407);
    assert_eq!(h.connector.calls(), 1);
}

#[tokio::test]
async fn connect_tunnels_bytes() {
    let echo = MockEchoServer::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let request = format!(
        "CONNECT {addr} HTTP/1.1\r\nHost: {addr}\r\nProxy-Authorization: {}\r\n\r\n",
        encode_basic("alice", "wonderland"),
        addr = echo.addr,
    );
    client.write_all(request.as_bytes()).await.unwrap();
    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");

    client.write_all(b"ping through tunnel").await.unwrap();
    let mut buf = [0u8; 19];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut buf))
        .await
        .expect("read timed out")
        .unwrap();
    assert_eq!(&buf, b"ping through tunnel");

    let info = h.sink.of(Protocol::Http, Phase::Info);
    assert_eq!(info.len(), 1);
    assert!(info[0].message().ends_with(&format!("<===> {}", echo.addr)));
}

#[tokio::test]
async fn connect_without_credentials_is_refused() {
    let echo = MockEchoServer::start();
    let (_dir, path) = creds_file("alice:wonderland\n");
    let h = start_frontend(Some(path)).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let request = format!("CONNECT {addr} HTTP/1.1\r\nHost: {addr}\r\n\r\n", addr = echo.addr);
    let resp = send(&mut client, request).await;
    assert_eq!(resp.status(), 407);
    assert_eq!(h.connector.calls(), 0);
}

#[tokio::test]
async fn origin_form_request_is_rejected() {
    let h = start_frontend(None).await;

    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(
        &mut client,
        "GET /local HTTP/1.1\r\nHost: example.com\r\n\r\n".to_string(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(h.connector.calls(), 0);
}

#[tokio::test]
async fn unreachable_origin_gets_502() {
    let closed = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let target = closed.local_addr().unwrap();
    drop(closed);

    let h = start_frontend(None).await;
    let mut client = TcpStream::connect(h.addr).await.unwrap();
    let resp = send(&mut client, get(target, "/", "")).await;
    assert_eq!(resp.status(), 502);
    assert_eq!(h.connector.calls(), 1);
}
