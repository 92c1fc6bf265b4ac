//! Bridge orchestrator.
//!
//! # Responsibilities
//! - Public API: connect, add/remove routes, subscribe, introspect
//! - Handle inbound messages: lookup → translate → execute → dispatch
//! - Contain every per-message error at the message boundary
//!
//! # Design Decisions
//! - The route is cloned at lookup; a disconnect mid-flight cannot change it
//! - A missing route is "no route", even when caused by a disconnect race
//! - No retries; failed upstream calls are logged and dropped

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::{load_config, BridgeConfig, HttpClientConfig, TransportOptions};
use crate::connection::{ConnectionStatus, ConnectionSupervisor, InboundHandler};
use crate::error::{BridgeError, BridgeResult};
use crate::http::{translate, ExecutorError, HttpExecutor, ReqwestExecutor, ResponseDispatcher};
use crate::observability::metrics;
use crate::routing::{HttpMethod, Route, RouteOptions, RouteTable};
use crate::transport::{Connector, MqttConnector};

/// MQTT ⇄ HTTP bridge. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    table: Arc<RouteTable>,
    supervisor: Arc<ConnectionSupervisor>,
    executor: Arc<dyn HttpExecutor>,
    dispatcher: ResponseDispatcher,
}

impl Bridge {
    /// Build a bridge over the given transport and HTTP capabilities.
    pub fn new(connector: Arc<dyn Connector>, executor: Arc<dyn HttpExecutor>) -> Self {
        let table = Arc::new(RouteTable::new());
        let supervisor = Arc::new(ConnectionSupervisor::new(connector, executor.clone(), table.clone()));

        Self {
            inner: Arc::new(BridgeInner {
                table,
                supervisor,
                executor,
                dispatcher: ResponseDispatcher::new(),
            }),
        }
    }

    /// Bridge over rumqttc and reqwest.
    pub fn mqtt(http: &HttpClientConfig) -> Result<Self, ExecutorError> {
        let executor = ReqwestExecutor::new(http)?;
        Ok(Self::new(Arc::new(MqttConnector::new()), Arc::new(executor)))
    }

    fn handler(&self) -> Weak<dyn InboundHandler> {
        let handler: Arc<dyn InboundHandler> = self.inner.clone();
        Arc::downgrade(&handler)
    }

    /// Open the transport and probe the HTTP peer.
    ///
    /// Returns as soon as the connection is initiated; use
    /// [`Bridge::wait_until_connected`] or [`Bridge::connect_until_ready`]
    /// to wait for the broker.
    pub async fn connect(
        &self,
        address: &str,
        peer_address: &str,
        options: &TransportOptions,
    ) -> BridgeResult<ConnectionStatus> {
        self.inner
            .supervisor
            .connect(address, peer_address, options, self.handler())
            .await
    }

    /// Like [`Bridge::connect`], then wait up to `timeout` for the broker.
    pub async fn connect_until_ready(
        &self,
        address: &str,
        peer_address: &str,
        options: &TransportOptions,
        timeout: Option<Duration>,
    ) -> BridgeResult<ConnectionStatus> {
        self.connect(address, peer_address, options).await?;
        self.wait_until_connected(timeout).await;
        Ok(self.status())
    }

    /// Connect using an already-parsed config; its routes load on connect.
    pub async fn connect_with_config(&self, config: BridgeConfig) -> BridgeResult<ConnectionStatus> {
        let address = config.mqtt_host.clone();
        let peer = config.http_host.clone();
        let options = config.mqtt_options.clone();

        self.inner.supervisor.set_config(config);
        self.connect(&address, &peer, &options).await
    }

    /// Load a config file and connect with it.
    pub async fn connect_with_config_file(&self, path: &Path) -> BridgeResult<ConnectionStatus> {
        let config = load_config(path)?;
        self.connect_with_config(config).await
    }

    /// Resolve once the transport is connected, or `false` after `timeout`.
    pub async fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        self.inner.supervisor.wait_until_connected(timeout).await
    }

    /// Replace the config and resync config routes.
    pub async fn reload_config(&self, config: BridgeConfig) {
        self.inner.supervisor.apply_config(config).await;
    }

    /// Route `topic` to `url`. Subscribes first, then registers the route.
    ///
    /// Manual routes are re-subscribed after a reconnect.
    pub async fn add_route(&self, topic: &str, url: &str, options: RouteOptions) -> BridgeResult<()> {
        let route = Route::new(topic, url, options)?;

        // failures are logged per topic and not fatal
        self.inner.supervisor.subscribe(&[topic]).await;

        self.inner.supervisor.retain_manual_route(route.clone());
        self.inner.table.add(route)?;
        metrics::record_route_count(self.inner.table.len());

        tracing::info!(topic = %topic, url = %url, "Route added");
        Ok(())
    }

    /// Unsubscribe from `topic` and drop its route.
    pub async fn remove_route(&self, topic: &str) -> Option<Route> {
        self.inner.supervisor.unsubscribe(topic).await;

        let manual = self.inner.supervisor.forget_manual_route(topic);
        let routed = self.inner.table.remove(topic);
        metrics::record_route_count(self.inner.table.len());

        let removed = routed.or(manual);
        if removed.is_some() {
            tracing::info!(topic = %topic, "Route removed");
        }
        removed
    }

    /// Subscribe to topics without adding routes.
    pub async fn subscribe<S: AsRef<str> + Sync>(&self, topics: &[S]) -> Vec<BridgeError> {
        self.inner.supervisor.subscribe(topics).await
    }

    /// Snapshot of the route table.
    pub fn get_routes(&self) -> BTreeMap<String, Route> {
        self.inner.table.all()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.supervisor.status()
    }

    pub fn config(&self) -> Option<Arc<BridgeConfig>> {
        self.inner.supervisor.config()
    }

    /// Process one inbound message to completion.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) {
        self.inner.handle_message(topic, payload).await;
    }

    /// Stop the event pump and disconnect from the broker.
    pub async fn disconnect(&self) {
        self.inner.supervisor.shutdown().await;
        tracing::info!("Bridge disconnected");
    }
}

impl BridgeInner {
    async fn handle_message(&self, topic: &str, payload: &[u8]) {
        metrics::record_message_received();

        let Some(route) = self.table.get(topic) else {
            let err = BridgeError::NoRouteForTopic(topic.to_string());
            tracing::error!(topic = %topic, error = %err, "Dropping message");
            metrics::record_message_dropped(err.kind());
            return;
        };

        let request = match translate(&route, payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Dropping message");
                metrics::record_message_dropped(e.kind());
                return;
            }
        };

        tracing::debug!(
            topic = %topic,
            method = %request.method,
            url = %request.url,
            "Forwarding message"
        );

        let start = Instant::now();
        let outcome = match self.executor.execute(&request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(format!("upstream returned status {}", response.status)),
            Err(e) => Err(e.to_string()),
        };

        let response = match outcome {
            Ok(response) => {
                metrics::record_upstream_request(request.method.as_str(), "success", start);
                response
            }
            Err(reason) => {
                metrics::record_upstream_request(request.method.as_str(), "failure", start);
                let err = BridgeError::UpstreamRequestFailed {
                    url: request.url.clone(),
                    reason,
                };
                tracing::error!(topic = %topic, url = %request.url, error = %err, "Upstream request failed");
                metrics::record_message_dropped(err.kind());
                return;
            }
        };

        if request.method != HttpMethod::Get {
            return;
        }

        let Some(client) = self.supervisor.client() else {
            tracing::warn!(topic = %topic, "No transport client, response not dispatched");
            return;
        };
        self.dispatcher.dispatch(client, &route, response).await;
    }
}

#[async_trait]
impl InboundHandler for BridgeInner {
    async fn on_message(&self, topic: String, payload: Vec<u8>) {
        self.handle_message(&topic, &payload).await;
    }
}
