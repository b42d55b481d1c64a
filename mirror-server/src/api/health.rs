//! Health Check API

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub ledger_gateway: String,
    pub environment: String,
}

/// GET /api/health - 服务健康状态
async fn health(State(state): State<ServerState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        ledger_gateway: state.config.ledger_gateway_url.clone(),
        environment: state.config.environment.clone(),
    })
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}
