use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;
use crate::middleware::ApiResponse;

/// GET / - Service description
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::success(json!({
        "name": "FlowForge API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "container_driver": state.containers.name(),
        "endpoints": {
            "project": "/api/v1/project[/:project_id[/settings|/logs|/audit-log|/actions/:action]]",
            "templates": "/api/v1/templates[/:id]",
            "stacks": "/api/v1/stacks",
            "health": "/health",
        }
    }))
}

/// GET /health - Store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
