//! HTTP side of the bridge.
//!
//! # Data Flow
//! ```text
//! Route + payload
//!     → request.rs (translate to RequestDescriptor)
//!     → executor.rs (HttpExecutor: reqwest or test double)
//!     → response.rs (GET only: callback / relay publish)
//! ```
//!
//! # Design Decisions
//! - Translation is pure and fails before any I/O
//! - POST/PUT/DELETE are fire-and-forget; only GET responses are relayed

pub mod executor;
pub mod request;
pub mod response;

pub use executor::{ExecutorError, HttpExecutor, HttpResponse, ReqwestExecutor};
pub use request::{translate, RequestDescriptor};
pub use response::ResponseDispatcher;
