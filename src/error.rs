//! Bridge error taxonomy.
//!
//! # Propagation
//! - Per-message errors (no route, malformed payload, upstream failure,
//!   callback failure) are logged and the message is dropped
//! - Connection errors are logged and returned to the caller of `connect`
//! - Subscribe failures are per-topic and never abort a batch

use thiserror::Error;

/// Errors produced by the bridge core.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The pub/sub transport could not be opened.
    #[error("failed to connect to transport at {address}: {reason}")]
    TransportConnect { address: String, reason: String },

    /// The HTTP peer did not answer the reachability probe.
    #[error("HTTP peer {address} unreachable: {reason}")]
    PeerUnreachable { address: String, reason: String },

    /// A single topic subscription failed.
    #[error("subscribe to {topic} failed: {reason}")]
    SubscribeFailed { topic: String, reason: String },

    /// A message arrived on a topic without a route.
    #[error("no route found for topic {0}")]
    NoRouteForTopic(String),

    /// The payload of a body-carrying static route was not valid JSON.
    #[error("malformed payload on topic {topic}: {reason}")]
    MalformedPayload { topic: String, reason: String },

    /// The payload of a dynamic route did not describe an HTTP call.
    #[error("malformed dynamic payload on topic {topic}: {reason}")]
    MalformedDynamicPayload { topic: String, reason: String },

    /// The HTTP call failed at the network level or returned non-2xx.
    #[error("error reaching target {url}: {reason}")]
    UpstreamRequestFailed { url: String, reason: String },

    /// A response callback returned an error or panicked.
    #[error("callback for {topic} failed: {reason}")]
    Callback { topic: String, reason: String },

    /// A route could not be registered.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::loader::ConfigError),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::TransportConnect { .. } => "transport_connect",
            BridgeError::PeerUnreachable { .. } => "peer_unreachable",
            BridgeError::SubscribeFailed { .. } => "subscribe_failed",
            BridgeError::NoRouteForTopic(_) => "no_route",
            BridgeError::MalformedPayload { .. } => "malformed_payload",
            BridgeError::MalformedDynamicPayload { .. } => "malformed_dynamic_payload",
            BridgeError::UpstreamRequestFailed { .. } => "upstream_failed",
            BridgeError::Callback { .. } => "callback_error",
            BridgeError::InvalidRoute(_) => "invalid_route",
            BridgeError::Config(_) => "config",
        }
    }
}
