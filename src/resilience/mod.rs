//! Resilience subsystem.
//!
//! # Scope
//! - Reconnect delays for the pub/sub transport (backoff.rs)
//!
//! # Design Decisions
//! - No retries of HTTP calls at this layer; a failed upstream request is
//!   logged and the message dropped
//! - HTTP timeouts are owned by the executor's client configuration

pub mod backoff;
