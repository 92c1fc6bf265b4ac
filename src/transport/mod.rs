//! Pub/sub transport abstraction.
//!
//! # Data Flow
//! ```text
//! Connector::connect(address, options)
//!     → TransportSession { client, events }
//!
//! client:  subscribe / unsubscribe / publish (shared, used concurrently)
//! events:  Connected | Message | Disconnected | Error  (consumed by the supervisor)
//! ```
//!
//! # Design Decisions
//! - The bridge core only sees these traits; `mqtt.rs` is one adapter
//! - Events are delivered over an unbounded channel so the transport never
//!   waits on the bridge

pub mod mqtt;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::TransportOptions;

pub use mqtt::MqttConnector;

/// Errors raised by a transport adapter.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid broker address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid transport option: {0}")]
    InvalidOption(String),

    #[error("transport request failed: {0}")]
    Request(String),

    #[error("transport closed")]
    Closed,
}

/// Connection events emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Message { topic: String, payload: Vec<u8> },
    Disconnected,
    Error(String),
}

/// Subscribe/publish capability of a connected transport.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Close the connection. Adapters without a notion of closing may ignore it.
    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// An opened transport: the client handle and its event stream.
pub struct TransportSession {
    pub client: Arc<dyn PubSubClient>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transport sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        options: &TransportOptions,
    ) -> Result<TransportSession, TransportError>;
}
