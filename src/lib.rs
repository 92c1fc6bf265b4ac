//! MQTT ⇄ HTTP bridge library.
//!
//! Messages arriving on routed MQTT topics become HTTP requests; bodies of
//! successful GET responses are published back on a response topic.

// Core subsystems
pub mod bridge;
pub mod config;
pub mod connection;
pub mod http;
pub mod routing;
pub mod transport;

// Outer surfaces
pub mod admin;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use bridge::Bridge;
pub use config::{BridgeConfig, RouteConfig, TransportOptions};
pub use connection::ConnectionStatus;
pub use error::{BridgeError, BridgeResult};
pub use lifecycle::Shutdown;
pub use routing::{HttpMethod, ResponseCallback, Route, RouteOptions};
