//! Route table.
//!
//! # Responsibilities
//! - Store routes keyed by topic
//! - Look up the route for an inbound message
//! - Provide snapshots for introspection
//!
//! # Design Decisions
//! - Backed by `DashMap` so message tasks read while connection events write
//! - `get` returns an owned clone; in-flight messages keep the route they
//!   started with even if the table is cleared underneath them
//! - Last write wins on duplicate topics

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::routing::route::Route;

/// Thread-safe topic → route mapping.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: DashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a route. Returns the route it replaced.
    pub fn add(&self, route: Route) -> BridgeResult<Option<Route>> {
        if route.topic.trim().is_empty() {
            return Err(BridgeError::InvalidRoute("topic must not be empty".into()));
        }
        let previous = self.routes.insert(route.topic.clone(), route);
        if let Some(prev) = &previous {
            tracing::debug!(topic = %prev.topic, "Replacing existing route");
        }
        Ok(previous)
    }

    /// Look up the route for a topic.
    pub fn get(&self, topic: &str) -> Option<Route> {
        self.routes.get(topic).map(|r| r.value().clone())
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.routes.contains_key(topic)
    }

    pub fn remove(&self, topic: &str) -> Option<Route> {
        self.routes.remove(topic).map(|(_, route)| route)
    }

    pub fn clear(&self) {
        self.routes.clear();
    }

    /// Topics currently routed, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.routes.iter().map(|r| r.key().clone()).collect();
        topics.sort();
        topics
    }

    /// Point-in-time copy of the whole table.
    pub fn all(&self) -> BTreeMap<String, Route> {
        self.routes
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
