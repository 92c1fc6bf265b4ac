//! Message → HTTP request translation.
//!
//! # Responsibilities
//! - Build a `RequestDescriptor` from a route and a message payload
//! - Decode dynamic payloads (`{method, url, data?}`)
//! - Reject payloads that cannot become a request body
//!
//! # Design Decisions
//! - Pure function, no I/O
//! - GET never carries a body, even in dynamic mode
//! - Body-carrying methods require a JSON payload; an empty payload is malformed

use serde::Deserialize;
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::routing::{HttpMethod, Route};

/// A fully resolved HTTP call, built per inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

/// Payload published on a dynamic route.
#[derive(Debug, Deserialize)]
struct DynamicPayload {
    method: Option<String>,
    url: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Translate an inbound message into the HTTP call it stands for.
pub fn translate(route: &Route, payload: &[u8]) -> BridgeResult<RequestDescriptor> {
    if route.dynamic {
        translate_dynamic(route, payload)
    } else {
        translate_static(route, payload)
    }
}

fn translate_static(route: &Route, payload: &[u8]) -> BridgeResult<RequestDescriptor> {
    let body = if route.method.carries_body() {
        let value = serde_json::from_slice::<Value>(payload).map_err(|e| BridgeError::MalformedPayload {
            topic: route.topic.clone(),
            reason: e.to_string(),
        })?;
        Some(value)
    } else {
        None
    };

    Ok(RequestDescriptor {
        method: route.method,
        url: route.target_url.clone(),
        body,
    })
}

fn translate_dynamic(route: &Route, payload: &[u8]) -> BridgeResult<RequestDescriptor> {
    let malformed = |reason: String| BridgeError::MalformedDynamicPayload {
        topic: route.topic.clone(),
        reason,
    };

    let parsed: DynamicPayload = serde_json::from_slice(payload).map_err(|e| malformed(e.to_string()))?;

    let method: HttpMethod = parsed
        .method
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| malformed("missing 'method'".into()))?
        .parse()
        .map_err(malformed)?;

    let url = parsed
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| malformed("missing 'url'".into()))?;

    let body = if method.carries_body() { parsed.data } else { None };

    Ok(RequestDescriptor { method, url, body })
}
