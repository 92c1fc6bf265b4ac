//! Admin HTTP API.
//!
//! # Endpoints
//! - `GET /admin/status`: version and connection flags
//! - `GET /admin/routes`: route table snapshot
//! - `POST /admin/routes`: add a manual route
//! - `DELETE /admin/routes/{*topic}`: remove a route (topics may contain `/`)

pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    routing::{delete, get},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::handlers::*;
use crate::Bridge;

pub fn setup_admin_router(bridge: Bridge) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes).post(add_route))
        .route("/admin/routes/{*topic}", delete(remove_route))
        .layer(TraceLayer::new_for_http())
        .with_state(bridge)
}

/// Serve the admin API until `shutdown` resolves.
pub async fn serve<F>(bind_address: SocketAddr, bridge: Bridge, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(bridge))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
