//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound message (topic, payload)
//!     → table.rs (route lookup by topic)
//!     → Return: cloned Route or None
//!
//! Table population:
//!     config routes + manual routes
//!     → Route::from_config / Route::new
//!     → RouteTable (cleared on disconnect, rebuilt on connect)
//! ```
//!
//! # Design Decisions
//! - Exact topic match, no wildcards
//! - The table is a derived cache; config and the manual registry are the
//!   sources of truth

pub mod route;
pub mod table;

pub use route::{HttpMethod, ResponseCallback, Route, RouteOptions, RouteOrigin};
pub use table::RouteTable;
