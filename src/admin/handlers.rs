use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::connection::ConnectionStatus;
use crate::routing::{HttpMethod, Route, RouteOptions};
use crate::Bridge;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub connection: ConnectionStatus,
    pub routes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRouteRequest {
    pub topic: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub response_topic: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
}

pub async fn get_status(State(bridge): State<Bridge>) -> Json<SystemStatus> {
    let connection = bridge.status();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if connection.is_ready() { "operational" } else { "degraded" },
        connection,
        routes: bridge.get_routes().len(),
    })
}

pub async fn get_routes(State(bridge): State<Bridge>) -> Json<BTreeMap<String, Route>> {
    Json(bridge.get_routes())
}

pub async fn add_route(State(bridge): State<Bridge>, Json(request): Json<AddRouteRequest>) -> Response {
    let mut options = RouteOptions::new()
        .method(request.method)
        .dynamic(request.dynamic);
    options.response_topic = request.response_topic;

    match bridge.add_route(&request.topic, &request.url, options).await {
        Ok(()) => match bridge.get_routes().remove(&request.topic) {
            Some(route) => (StatusCode::CREATED, Json(route)).into_response(),
            None => StatusCode::CREATED.into_response(),
        },
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn remove_route(State(bridge): State<Bridge>, Path(topic): Path<String>) -> StatusCode {
    match bridge.remove_route(&topic).await {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
