//! HTTP execution capability.
//!
//! # Responsibilities
//! - Execute a `RequestDescriptor` and return status + body
//! - Probe the peer base address for reachability
//!
//! # Design Decisions
//! - Non-2xx responses are errors; only success reaches the dispatcher
//! - Timeouts come from the reqwest client configuration
//! - No retries here

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::HttpClientConfig;
use crate::http::request::RequestDescriptor;

/// Errors from the HTTP executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out")]
    Timeout,

    #[error("upstream returned status {status}")]
    Status { status: u16, body: Vec<u8> },
}

impl From<reqwest::Error> for ExecutorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExecutorError::Timeout
        } else {
            ExecutorError::Transport(e.to_string())
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as JSON: parsed when possible, otherwise the text as a string.
    pub fn json_body(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }
}

/// Performs HTTP calls on behalf of the bridge.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, ExecutorError>;

    /// Best-effort reachability check of the peer.
    async fn probe(&self, base_address: &str) -> Result<(), ExecutorError>;
}

/// `HttpExecutor` backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(config: &HttpClientConfig) -> Result<Self, ExecutorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, ExecutorError> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        let response = HttpResponse { status, body };
        if !response.is_success() {
            return Err(ExecutorError::Status { status, body: response.body });
        }
        Ok(response)
    }

    async fn probe(&self, base_address: &str) -> Result<(), ExecutorError> {
        let response = self.client.get(base_address).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecutorError::Status { status: status.as_u16(), body: Vec::new() });
        }
        Ok(())
    }
}
