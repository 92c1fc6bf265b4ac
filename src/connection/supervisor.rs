//! Connection supervisor.
//!
//! # Responsibilities
//! - Open the transport and own the client handle
//! - Pump transport events: connect, message, disconnect, error
//! - Keep the route table in step with the connection
//! - Probe the HTTP peer
//!
//! # Design Decisions
//! - On connect the table is rebuilt from config routes plus manual routes,
//!   then every topic is subscribed
//! - On disconnect the table is cleared first, then every topic unsubscribed
//! - Manual routes live in their own registry and survive reconnects
//! - Topics passed to `subscribe` are remembered and re-issued on every
//!   connect, so subscribing before the transport is up is deferred, not lost
//! - Messages are handled on their own tasks; the pump never waits on HTTP
//! - `connect` must not be called concurrently on the same instance

use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{BridgeConfig, TransportOptions};
use crate::connection::state::{ConnectionState, ConnectionStatus};
use crate::error::{BridgeError, BridgeResult};
use crate::http::HttpExecutor;
use crate::observability::metrics;
use crate::routing::{Route, RouteTable};
use crate::transport::{Connector, PubSubClient, TransportEvent};

/// Receives inbound messages from the event pump.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    async fn on_message(&self, topic: String, payload: Vec<u8>);
}

/// Owns the transport connection and keeps routes subscribed.
pub struct ConnectionSupervisor {
    connector: Arc<dyn Connector>,
    executor: Arc<dyn HttpExecutor>,
    state: ConnectionState,
    table: Arc<RouteTable>,
    manual_routes: DashMap<String, Route>,
    extra_topics: DashSet<String>,
    config: ArcSwapOption<BridgeConfig>,
    client: RwLock<Option<Arc<dyn PubSubClient>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionSupervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        executor: Arc<dyn HttpExecutor>,
        table: Arc<RouteTable>,
    ) -> Self {
        Self {
            connector,
            executor,
            state: ConnectionState::new(),
            table,
            manual_routes: DashMap::new(),
            extra_topics: DashSet::new(),
            config: ArcSwapOption::empty(),
            client: RwLock::new(None),
            pump: Mutex::new(None),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.snapshot()
    }

    /// Current client handle, if a transport has been opened.
    pub fn client(&self) -> Option<Arc<dyn PubSubClient>> {
        self.client.read().ok().and_then(|guard| guard.clone())
    }

    pub fn config(&self) -> Option<Arc<BridgeConfig>> {
        self.config.load_full()
    }

    /// Store the config whose routes are loaded on every connect.
    pub fn set_config(&self, config: BridgeConfig) {
        self.config.store(Some(Arc::new(config)));
    }

    /// Open the transport, start the event pump and probe the peer.
    pub async fn connect(
        self: &Arc<Self>,
        address: &str,
        peer_address: &str,
        options: &TransportOptions,
        handler: Weak<dyn InboundHandler>,
    ) -> BridgeResult<ConnectionStatus> {
        let session = match self.connector.connect(address, options).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Error connecting to transport");
                return Err(BridgeError::TransportConnect {
                    address: address.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if let Ok(mut guard) = self.client.write() {
            *guard = Some(session.client);
        }

        let pump = tokio::spawn(Self::pump(Arc::downgrade(self), session.events, handler));
        if let Ok(mut guard) = self.pump.lock() {
            if let Some(previous) = guard.replace(pump) {
                previous.abort();
            }
        }

        if let Err(e) = self.probe_peer(peer_address).await {
            tracing::warn!(error = %e, "HTTP peer probe failed, requests will still be attempted");
        }

        Ok(self.status())
    }

    /// Wait for the transport to report connected.
    pub async fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        self.state.wait_until_connected(timeout).await
    }

    /// Best-effort reachability check of the HTTP peer.
    pub async fn probe_peer(&self, peer_address: &str) -> BridgeResult<()> {
        match self.executor.probe(peer_address).await {
            Ok(()) => {
                self.state.set_peer_connected(true);
                tracing::debug!(address = %peer_address, "HTTP connection established");
                Ok(())
            }
            Err(e) => {
                self.state.set_peer_connected(false);
                Err(BridgeError::PeerUnreachable {
                    address: peer_address.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn pump(
        supervisor: Weak<Self>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        handler: Weak<dyn InboundHandler>,
    ) {
        while let Some(event) = events.recv().await {
            let Some(supervisor) = supervisor.upgrade() else {
                break;
            };

            match event {
                TransportEvent::Connected => supervisor.on_connect().await,
                TransportEvent::Message { topic, payload } => {
                    let Some(handler) = handler.upgrade() else {
                        tracing::debug!(topic = %topic, "Bridge dropped, ignoring message");
                        continue;
                    };
                    tokio::spawn(async move { handler.on_message(topic, payload).await });
                }
                TransportEvent::Disconnected => supervisor.on_disconnect().await,
                TransportEvent::Error(e) => {
                    tracing::error!(error = %e, "Transport error");
                }
            }
        }
        tracing::debug!("Transport event stream closed");
    }

    /// Transport connected: rebuild the table and subscribe every topic.
    ///
    /// The connected flag flips last, so waiters see a subscribed table.
    pub async fn on_connect(&self) {
        tracing::info!("MQTT connection established");

        if let Some(config) = self.config.load_full() {
            for (topic, route_config) in &config.routes {
                match Route::from_config(topic, route_config) {
                    Ok(route) => self.load_route(route),
                    Err(e) => tracing::warn!(topic = %topic, error = %e, "Skipping config route"),
                }
            }
        }
        let manual: Vec<Route> = self.manual_routes.iter().map(|entry| entry.value().clone()).collect();
        for route in manual {
            self.load_route(route);
        }

        let mut topics = self.table.topics();
        for topic in self.extra_topics.iter() {
            if !topics.contains(topic.key()) {
                topics.push(topic.key().clone());
            }
        }
        self.issue_subscriptions(&topics).await;
        metrics::record_route_count(self.table.len());
        self.state.set_transport_connected(true);
    }

    fn load_route(&self, route: Route) {
        let topic = route.topic.clone();
        if let Err(e) = self.table.add(route) {
            tracing::warn!(topic = %topic, error = %e, "Skipping route");
        }
    }

    /// Transport lost: clear the table, then unsubscribe its topics.
    ///
    /// The table is empty before any unsubscribe is awaited; a stalled
    /// transport queue cannot keep stale routes visible.
    pub async fn on_disconnect(&self) {
        self.state.set_transport_connected(false);
        tracing::info!("MQTT connection closed, clearing routes");

        let topics = self.table.topics();
        self.table.clear();
        metrics::record_route_count(0);

        if let Some(client) = self.client() {
            for topic in &topics {
                if let Err(e) = client.unsubscribe(topic).await {
                    tracing::debug!(topic = %topic, error = %e, "Unsubscribe failed");
                }
            }
        }
    }

    /// Subscribe to each topic independently. Returns the failures.
    ///
    /// Topics are remembered and re-subscribed on every connect. Without a
    /// transport client the subscriptions wait for the first connect.
    pub async fn subscribe<S: AsRef<str> + Sync>(&self, topics: &[S]) -> Vec<BridgeError> {
        for topic in topics {
            self.extra_topics.insert(topic.as_ref().to_string());
        }
        self.issue_subscriptions(topics).await
    }

    async fn issue_subscriptions<S: AsRef<str> + Sync>(&self, topics: &[S]) -> Vec<BridgeError> {
        let Some(client) = self.client() else {
            tracing::info!(count = topics.len(), "No transport client, subscriptions deferred until connect");
            return Vec::new();
        };

        let mut failures = Vec::new();
        for topic in topics {
            let topic = topic.as_ref();
            tracing::debug!(topic = %topic, "Subscribing");
            match client.subscribe(topic).await {
                Ok(()) => tracing::debug!(topic = %topic, "Subscribing: Success!"),
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "Error subscribing");
                    failures.push(BridgeError::SubscribeFailed {
                        topic: topic.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        failures
    }

    pub async fn unsubscribe(&self, topic: &str) {
        self.extra_topics.remove(topic);
        if let Some(client) = self.client() {
            if let Err(e) = client.unsubscribe(topic).await {
                tracing::warn!(topic = %topic, error = %e, "Error unsubscribing");
            }
        }
    }

    /// Register a manual route; it is re-added on every reconnect.
    pub fn retain_manual_route(&self, route: Route) {
        self.manual_routes.insert(route.topic.clone(), route);
    }

    pub fn forget_manual_route(&self, topic: &str) -> Option<Route> {
        self.manual_routes.remove(topic).map(|(_, route)| route)
    }

    /// Swap in a new config and, when connected, resync config routes.
    pub async fn apply_config(&self, config: BridgeConfig) {
        let previous = self.config.swap(Some(Arc::new(config)));
        let Some(current) = self.config.load_full() else {
            return;
        };

        if !self.state.is_transport_connected() {
            tracing::info!(routes = current.routes.len(), "Config updated, routes load on next connect");
            return;
        }

        let mut removed = Vec::new();
        if let Some(previous) = previous {
            for topic in previous.routes.keys() {
                let still_configured = current.routes.contains_key(topic);
                let manual = self.manual_routes.contains_key(topic);
                if !still_configured && !manual && self.table.remove(topic).is_some() {
                    removed.push(topic.clone());
                }
            }
        }
        for topic in &removed {
            self.unsubscribe(topic).await;
        }

        let mut added = Vec::new();
        for (topic, route_config) in &current.routes {
            if self.manual_routes.contains_key(topic) {
                continue;
            }
            let route = match Route::from_config(topic, route_config) {
                Ok(route) => route,
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "Skipping config route");
                    continue;
                }
            };
            let unchanged = self
                .table
                .get(topic)
                .is_some_and(|existing| existing.same_target(&route));
            if unchanged {
                continue;
            }
            let was_routed = self.table.contains(topic);
            self.load_route(route);
            if !was_routed {
                added.push(topic.clone());
            }
        }
        self.issue_subscriptions(&added).await;

        metrics::record_route_count(self.table.len());
        tracing::info!(
            added = added.len(),
            removed = removed.len(),
            total = self.table.len(),
            "Config routes reloaded"
        );
    }

    /// Stop the event pump and close the transport.
    pub async fn shutdown(&self) {
        if let Ok(mut guard) = self.pump.lock() {
            if let Some(pump) = guard.take() {
                pump.abort();
            }
        }

        let client = self.client.write().ok().and_then(|mut guard| guard.take());
        if let Some(client) = client {
            if let Err(e) = client.disconnect().await {
                tracing::debug!(error = %e, "Transport disconnect failed");
            }
        }

        self.state.set_transport_connected(false);
        self.table.clear();
        metrics::record_route_count(0);
    }
}
