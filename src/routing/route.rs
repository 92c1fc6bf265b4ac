//! Route definitions.
//!
//! # Responsibilities
//! - Describe one topic → HTTP target mapping
//! - Carry the response handling for GET routes
//! - Build routes from config entries and from `add_route` options
//!
//! # Design Decisions
//! - The response callback is an explicit enum; `Relay` is the default
//! - Routes are cloned out of the table at dispatch time, so `Route` is cheap
//!   to clone (callbacks are behind `Arc`)

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::config::RouteConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::transport::PubSubClient;

/// Boxed error returned by custom callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a custom callback.
pub type CallbackFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// Signature of a custom callback: client, response topic, response body.
pub type CallbackFn = dyn Fn(Arc<dyn PubSubClient>, String, Value) -> CallbackFuture + Send + Sync;

/// HTTP methods a route may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the message payload becomes the request body.
    pub fn carries_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// What happens with the body of a successful GET.
#[derive(Clone, Default)]
pub enum ResponseCallback {
    /// Publish the body as JSON on the response topic.
    #[default]
    Relay,
    /// Hand the body to user code.
    Custom(Arc<CallbackFn>),
}

impl ResponseCallback {
    /// Wrap an async closure as a custom callback.
    pub fn custom<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<dyn PubSubClient>, String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        ResponseCallback::Custom(Arc::new(move |client, topic, body| {
            Box::pin(f(client, topic, body)) as CallbackFuture
        }))
    }

    pub fn is_relay(&self) -> bool {
        matches!(self, ResponseCallback::Relay)
    }
}

impl fmt::Debug for ResponseCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCallback::Relay => f.write_str("Relay"),
            ResponseCallback::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Serialize for ResponseCallback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.is_relay() { "relay" } else { "custom" })
    }
}

/// Where a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOrigin {
    /// Expanded from the `routes` section of the config.
    Config,
    /// Registered through `Bridge::add_route`.
    Manual,
}

/// A single topic → HTTP mapping.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub topic: String,
    pub target_url: String,
    pub method: HttpMethod,
    pub response_topic: String,
    pub dynamic: bool,
    pub callback: ResponseCallback,
    pub origin: RouteOrigin,
}

/// Optional settings for `Bridge::add_route`.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub response_topic: Option<String>,
    pub method: HttpMethod,
    pub dynamic: bool,
    pub callback: ResponseCallback,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn response_topic(mut self, topic: impl Into<String>) -> Self {
        self.response_topic = Some(topic.into());
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn callback(mut self, callback: ResponseCallback) -> Self {
        self.callback = callback;
        self
    }
}

/// Default response topic for a route topic.
pub fn default_response_topic(topic: &str) -> String {
    format!("{}/response", topic)
}

impl Route {
    /// Build a manually registered route.
    pub fn new(topic: impl Into<String>, target_url: impl Into<String>, options: RouteOptions) -> BridgeResult<Self> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(BridgeError::InvalidRoute("topic must not be empty".into()));
        }
        let response_topic = options
            .response_topic
            .unwrap_or_else(|| default_response_topic(&topic));

        Ok(Self {
            target_url: target_url.into(),
            method: options.method,
            response_topic,
            dynamic: options.dynamic,
            callback: options.callback,
            origin: RouteOrigin::Manual,
            topic,
        })
    }

    /// Expand one entry of the config `routes` map.
    pub fn from_config(topic: &str, config: &RouteConfig) -> BridgeResult<Self> {
        let mut options = RouteOptions::new()
            .method(config.method)
            .dynamic(config.dynamic);
        options.response_topic = config.response_topic.clone();

        let mut route = Route::new(topic, config.route.clone(), options)?;
        route.origin = RouteOrigin::Config;
        Ok(route)
    }

    /// True when two routes would produce the same traffic.
    ///
    /// Callbacks are compared by kind only; config routes always relay.
    pub fn same_target(&self, other: &Route) -> bool {
        self.topic == other.topic
            && self.target_url == other.target_url
            && self.method == other.method
            && self.response_topic == other.response_topic
            && self.dynamic == other.dynamic
            && self.callback.is_relay() == other.callback.is_relay()
    }
}
