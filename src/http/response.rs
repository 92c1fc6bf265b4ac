//! HTTP response → published message.
//!
//! # Responsibilities
//! - Hand the body of a successful GET to the route's callback
//! - Default relay: publish the JSON body on the response topic
//! - Contain callback failures and panics
//!
//! # Design Decisions
//! - The callback runs in its own task so a panic is observed as a `JoinError`
//! - Failures are logged and counted, never returned to the orchestrator

use std::sync::Arc;

use serde_json::Value;

use crate::error::BridgeError;
use crate::http::executor::HttpResponse;
use crate::observability::metrics;
use crate::routing::{ResponseCallback, Route};
use crate::transport::PubSubClient;

/// Delivers GET responses to their route's callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseDispatcher;

impl ResponseDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Invoke `route.callback(client, route.response_topic, body)`.
    pub async fn dispatch(&self, client: Arc<dyn PubSubClient>, route: &Route, response: HttpResponse) {
        let body = response.json_body();
        if let Err(e) = invoke(client, route, body).await {
            tracing::error!(
                topic = %route.topic,
                response_topic = %route.response_topic,
                error = %e,
                "Response callback failed"
            );
            metrics::record_message_dropped(e.kind());
        }
    }
}

async fn invoke(client: Arc<dyn PubSubClient>, route: &Route, body: Value) -> Result<(), BridgeError> {
    let response_topic = route.response_topic.clone();
    let callback_error = |reason: String| BridgeError::Callback {
        topic: route.topic.clone(),
        reason,
    };

    let task = match &route.callback {
        ResponseCallback::Relay => {
            let payload = serde_json::to_vec(&body).map_err(|e| callback_error(e.to_string()))?;
            tokio::spawn(async move {
                tracing::debug!(topic = %response_topic, "Publishing response");
                client
                    .publish(&response_topic, payload)
                    .await
                    .map_err(|e| e.to_string())?;
                metrics::record_response_published();
                Ok::<(), String>(())
            })
        }
        ResponseCallback::Custom(callback) => {
            let fut = callback(client, response_topic, body);
            tokio::spawn(async move { fut.await.map_err(|e| e.to_string()) })
        }
    };

    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => Err(callback_error(reason)),
        Err(join) if join.is_panic() => Err(callback_error("callback panicked".into())),
        Err(join) => Err(callback_error(join.to_string())),
    }
}
