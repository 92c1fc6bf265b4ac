//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route URLs and topics
//! - Validate value ranges (keep-alive, QoS, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;
use crate::transport::mqtt::BrokerEndpoint;

/// A single semantic problem in a config.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid mqtt_host '{0}'")]
    InvalidBrokerAddress(String),

    #[error("invalid http_host '{0}'")]
    InvalidPeerAddress(String),

    #[error("route topic must not be empty")]
    EmptyTopic,

    #[error("route '{0}' has no target URL and is not dynamic")]
    MissingRouteUrl(String),

    #[error("route '{topic}' has invalid URL '{url}'")]
    InvalidRouteUrl { topic: String, url: String },

    #[error("route '{0}' has an empty response topic")]
    EmptyResponseTopic(String),

    #[error("qos must be 0, 1 or 2, got {0}")]
    InvalidQos(u8),

    #[error("keep_alive_secs must be at least 5, got {0}")]
    KeepAliveTooShort(u64),

    #[error("channel_capacity must be greater than 0")]
    ZeroChannelCapacity,

    #[error("http.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("invalid {field} '{value}'")]
    InvalidBindAddress { field: &'static str, value: String },
}

/// Validate a parsed config, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if BrokerEndpoint::parse(&config.mqtt_host).is_err() {
        errors.push(ValidationError::InvalidBrokerAddress(config.mqtt_host.clone()));
    }
    if Url::parse(&config.http_host).is_err() {
        errors.push(ValidationError::InvalidPeerAddress(config.http_host.clone()));
    }

    let options = &config.mqtt_options;
    if options.qos > 2 {
        errors.push(ValidationError::InvalidQos(options.qos));
    }
    if options.keep_alive_secs < 5 {
        errors.push(ValidationError::KeepAliveTooShort(options.keep_alive_secs));
    }
    if options.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for (topic, route) in &config.routes {
        if topic.trim().is_empty() {
            errors.push(ValidationError::EmptyTopic);
            continue;
        }
        if route.response_topic.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.push(ValidationError::EmptyResponseTopic(topic.clone()));
        }
        if route.route.is_empty() {
            if !route.dynamic {
                errors.push(ValidationError::MissingRouteUrl(topic.clone()));
            }
        } else if Url::parse(&route.route).is_err() {
            errors.push(ValidationError::InvalidRouteUrl {
                topic: topic.clone(),
                url: route.route.clone(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidBindAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
