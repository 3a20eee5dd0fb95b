use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::api::stack_view;
use crate::app::AppState;
use crate::database::models::NewStack;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::permissions::needs_admin;

/// GET /api/v1/stacks - All stacks
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let stacks = state.store.list_stacks().await?;
    Ok(ApiResponse::success(json!({
        "stacks": stacks.iter().map(stack_view).collect::<Vec<_>>(),
        "count": stacks.len(),
    })))
}

/// POST /api/v1/stacks - Register a stack (admin)
pub async fn post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<NewStack>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<Value> {
    needs_admin(&session)?;
    let Json(stack) = body?;

    if stack.name.trim().is_empty() {
        return Err(ApiError::bad_request("Stack name is required"));
    }
    if !stack.properties.is_object() {
        return Err(ApiError::bad_request("Stack properties must be an object"));
    }

    let created = state.store.create_stack(stack).await?;
    tracing::info!("Created stack {} ({})", created.name, created.id);
    Ok(ApiResponse::created(stack_view(&created)))
}
