//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use mqtt_http_bridge::config::TransportOptions;
use mqtt_http_bridge::http::{ExecutorError, HttpExecutor, HttpResponse, RequestDescriptor};
use mqtt_http_bridge::transport::{Connector, PubSubClient, TransportError, TransportEvent, TransportSession};
use mqtt_http_bridge::Bridge;

pub const BROKER: &str = "mqtt://broker.test:1883";
pub const PEER: &str = "http://peer.test";

/// Pub/sub client that records every call.
#[derive(Default)]
pub struct RecordingClient {
    pub subscribed: Mutex<Vec<String>>,
    pub unsubscribed: Mutex<Vec<String>>,
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
    failing_topics: Mutex<HashSet<String>>,
    stall_unsubscribe: AtomicBool,
}

impl RecordingClient {
    /// Make `subscribe(topic)` fail.
    pub fn fail_subscribe(&self, topic: &str) {
        self.failing_topics.lock().unwrap().insert(topic.to_string());
    }

    /// Make every later `unsubscribe` hang, like a full transport queue.
    pub fn stall_unsubscribes(&self) {
        self.stall_unsubscribe.store(true, Ordering::SeqCst);
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.unsubscribed.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl PubSubClient for RecordingClient {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        if self.failing_topics.lock().unwrap().contains(topic) {
            return Err(TransportError::Request(format!("subscribe to {} refused", topic)));
        }
        self.subscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        if self.stall_unsubscribe.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.unsubscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.published.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }
}

/// Connector whose events are driven by the test.
#[derive(Default)]
pub struct MockConnector {
    pub client: Arc<RecordingClient>,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
    refuse: bool,
}

impl MockConnector {
    pub fn refusing() -> Self {
        Self { refuse: true, ..Self::default() }
    }

    /// Deliver an event to the bridge's event pump.
    pub fn emit(&self, event: TransportEvent) {
        let guard = self.events.lock().unwrap();
        let tx = guard.as_ref().expect("connect not called");
        tx.send(event).expect("event pump gone");
    }

    pub fn message(&self, topic: &str, payload: &[u8]) {
        self.emit(TransportEvent::Message {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, address: &str, _options: &TransportOptions) -> Result<TransportSession, TransportError> {
        if self.refuse {
            return Err(TransportError::InvalidAddress {
                address: address.to_string(),
                reason: "connection refused".into(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        Ok(TransportSession {
            client: self.client.clone(),
            events: rx,
        })
    }
}

/// HTTP executor that records requests and answers with a canned response.
pub struct RecordingExecutor {
    pub requests: Mutex<Vec<RequestDescriptor>>,
    response: Mutex<HttpResponse>,
    pub probe_ok: bool,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response: Mutex::new(HttpResponse::new(200, "{}")),
            probe_ok: true,
        }
    }
}

impl RecordingExecutor {
    pub fn responding(status: u16, body: &str) -> Self {
        let executor = Self::default();
        executor.respond_with(status, body);
        executor
    }

    pub fn unreachable_peer() -> Self {
        Self { probe_ok: false, ..Self::default() }
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        *self.response.lock().unwrap() = HttpResponse::new(status, body);
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExecutor for RecordingExecutor {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, ExecutorError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self.response.lock().unwrap().clone();
        if !response.is_success() {
            return Err(ExecutorError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }

    async fn probe(&self, _base_address: &str) -> Result<(), ExecutorError> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(ExecutorError::Transport("peer unreachable".into()))
        }
    }
}

/// A bridge wired to mocks.
pub struct Harness {
    pub bridge: Bridge,
    pub connector: Arc<MockConnector>,
    pub executor: Arc<RecordingExecutor>,
}

impl Harness {
    pub fn new(executor: RecordingExecutor) -> Self {
        let connector = Arc::new(MockConnector::default());
        let executor = Arc::new(executor);
        let bridge = Bridge::new(connector.clone(), executor.clone());
        Self { bridge, connector, executor }
    }

    pub fn client(&self) -> &RecordingClient {
        &self.connector.client
    }

    /// Open the transport and report the broker connected.
    pub async fn connect(&self) {
        self.bridge
            .connect(BROKER, PEER, &TransportOptions::default())
            .await
            .unwrap();
        self.connector.emit(TransportEvent::Connected);
        assert!(self.bridge.wait_until_connected(Some(Duration::from_secs(2))).await);
    }
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn wait_for<F: Fn() -> bool>(check: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Request line and body seen by the mock backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a mock backend on an ephemeral port that answers every request
/// with `status` and `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            log.lock().unwrap().push(request);
                        }
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        204 => "204 No Content",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..end]).into_owned();

    Some(SeenRequest { method, path, body })
}
