use axum::{extract::State, Extension};
use serde_json::{json, Value};

use super::audit;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext, Session};
use crate::permissions::{needs_permission, Permission};
use crate::types::AuditEntity;

/// DELETE /api/v1/project/:project_id - Tear down the container and the record
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(ctx): Extension<ProjectContext>,
) -> ApiResult<Value> {
    needs_permission(&session, ctx.membership.as_ref(), Permission::ProjectDelete)?;

    let project = &ctx.project.project;
    let removed = async {
        state.containers.remove(project).await?;
        state.store.delete_project(project.id).await?;
        Ok::<_, ApiError>(())
    }
    .await;

    if let Err(e) = removed {
        tracing::error!("Failed to delete project {}: {}", project.id, e);
        return Err(ApiError::internal_server_error("Failed to delete project"));
    }
    tracing::info!("Deleted project {} ({})", project.name, project.id);

    audit(state.store.as_ref(), AuditEntity::Project(project.id), &session, "project.deleted", None).await;
    audit(state.store.as_ref(), AuditEntity::Team(project.team_id), &session, "project.deleted", None).await;

    Ok(ApiResponse::success(json!({ "status": "okay" })))
}
