use axum::{extract::State, Extension};
use serde_json::Value;

use crate::api::project_with_meta;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext};

/// GET /api/v1/project/:project_id - Project with live container details
pub async fn get(State(state): State<AppState>, Extension(ctx): Extension<ProjectContext>) -> ApiResult<Value> {
    let details = state.containers.details(&ctx.project.project).await?;
    Ok(ApiResponse::success(project_with_meta(&ctx.project, details)))
}
