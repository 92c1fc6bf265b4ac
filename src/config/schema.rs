//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.
//! The camelCase keys used by older bridge configs (`mqttHost`, `httpHost`,
//! `mqttOptions`, `responseTopic`) are accepted as aliases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::HttpMethod;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Broker address (e.g., "mqtt://localhost:1883").
    #[serde(alias = "mqttHost")]
    pub mqtt_host: String,

    /// Options passed to the pub/sub transport.
    #[serde(alias = "mqttOptions")]
    pub mqtt_options: TransportOptions,

    /// Base address of the HTTP peer, probed for reachability.
    #[serde(alias = "httpHost")]
    pub http_host: String,

    /// Topic → route definitions, loaded into the route table on connect.
    pub routes: BTreeMap<String, RouteConfig>,

    /// HTTP executor settings.
    pub http: HttpClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "mqtt://localhost".to_string(),
            mqtt_options: TransportOptions::default(),
            http_host: "https://localhost".to_string(),
            routes: BTreeMap::new(),
            http: HttpClientConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// One entry of the `routes` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Target URL. May be empty for dynamic routes.
    #[serde(default, alias = "url")]
    pub route: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: HttpMethod,

    /// Topic for relayed GET responses (default: "<topic>/response").
    #[serde(default, alias = "responseTopic")]
    pub response_topic: Option<String>,

    /// Take method/url/data from the message payload.
    #[serde(default)]
    pub dynamic: bool,
}

/// Pub/sub transport options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportOptions {
    /// Client identifier; a random one is generated when unset.
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,

    /// Keep-alive interval in seconds.
    #[serde(alias = "keepalive")]
    pub keep_alive_secs: u64,

    /// Start a clean session on every connect.
    #[serde(alias = "clean")]
    pub clean_session: bool,

    pub username: Option<String>,

    pub password: Option<String>,

    /// QoS level for subscriptions and publishes (0, 1 or 2).
    pub qos: u8,

    /// Capacity of the client request queue.
    pub channel_capacity: usize,

    /// First reconnect delay in milliseconds.
    pub reconnect_base_delay_ms: u64,

    /// Upper bound for reconnect delays in milliseconds.
    pub reconnect_max_delay_ms: u64,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            keep_alive_secs: 60,
            clean_session: true,
            username: None,
            password: None,
            qos: 0,
            channel_capacity: 64,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

/// HTTP executor settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// User-Agent header sent upstream.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
            user_agent: format!("mqtt-http-bridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (e.g., "info", "mqtt_http_bridge=debug").
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// Admin API bind address. There is no authentication, keep it local.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
