//! Connection lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Bridge::connect
//!     → supervisor.rs (Connector::connect, spawn event pump, probe peer)
//!
//! Event pump:
//!     Connected    → load routes → subscribe all → state.rs transport=true
//!     Message      → spawn InboundHandler::on_message
//!     Disconnected → state.rs transport=false → clear table → unsubscribe all
//!     Error        → log
//! ```

pub mod state;
pub mod supervisor;

pub use state::{ConnectionState, ConnectionStatus};
pub use supervisor::{ConnectionSupervisor, InboundHandler};
