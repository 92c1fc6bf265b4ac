//! Connection state.
//!
//! # States
//! ```text
//! Disconnected → Connecting → Connected ⇄ Disconnected
//! ```
//! `transport_connected` tracks the pub/sub link, `peer_connected` the last
//! HTTP probe. The bridge is ready when both are true.
//!
//! # Design Decisions
//! - The transport flag lives in a `watch` channel so callers can await it
//! - Only the supervisor mutates state

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::observability::metrics;

/// Point-in-time view of the connection flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionStatus {
    pub transport_connected: bool,
    pub peer_connected: bool,
}

impl ConnectionStatus {
    pub fn is_ready(&self) -> bool {
        self.transport_connected && self.peer_connected
    }
}

/// Shared connection flags.
#[derive(Debug)]
pub struct ConnectionState {
    transport: watch::Sender<bool>,
    peer: AtomicBool,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        let (transport, _) = watch::channel(false);
        Self {
            transport,
            peer: AtomicBool::new(false),
        }
    }

    /// Update the transport flag. Returns the previous value.
    pub fn set_transport_connected(&self, connected: bool) -> bool {
        metrics::record_transport_connected(connected);
        self.transport.send_replace(connected)
    }

    pub fn set_peer_connected(&self, connected: bool) {
        metrics::record_peer_connected(connected);
        self.peer.store(connected, Ordering::Relaxed);
    }

    pub fn is_transport_connected(&self) -> bool {
        *self.transport.borrow()
    }

    pub fn is_peer_connected(&self) -> bool {
        self.peer.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ConnectionStatus {
        ConnectionStatus {
            transport_connected: self.is_transport_connected(),
            peer_connected: self.is_peer_connected(),
        }
    }

    /// Resolve once the transport reports connected, or after `timeout`.
    ///
    /// Returns whether the transport is connected.
    pub async fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        let mut rx = self.transport.subscribe();
        let wait = async move { rx.wait_for(|connected| *connected).await.is_ok() };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or(false),
            None => wait.await,
        }
    }
}
