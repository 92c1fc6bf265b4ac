//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve `wait_for_shutdown_signal`
//!
//! Shutdown (shutdown.rs):
//!     trigger → admin server drains → bridge unsubscribes and disconnects
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop admin traffic first, then close the broker link
//! - Shutdown has timeout: forced exit after deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
