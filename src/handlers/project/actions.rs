use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::audit;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext, Session};
use crate::permissions::{needs_permission, Permission};
use crate::types::{AuditEntity, ProjectAction};

/// POST /api/v1/project/:project_id/actions/:action - start, stop or restart
pub async fn post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(ctx): Extension<ProjectContext>,
    Path(params): Path<HashMap<String, String>>,
) -> ApiResult<Value> {
    let action = params
        .get("action")
        .and_then(|a| ProjectAction::parse(a))
        .ok_or_else(|| ApiError::not_found("Not Found"))?;
    needs_permission(&session, ctx.membership.as_ref(), Permission::ProjectChangeStatus)?;

    let mut project = ctx.project.project;
    match action {
        ProjectAction::Start => state.containers.start(&project).await?,
        ProjectAction::Stop => state.containers.stop(&project).await?,
        ProjectAction::Restart => state.containers.restart(&project).await?,
    }

    project.set_state(action.resulting_state());
    let project = state.store.update_project(&project).await?;
    tracing::info!(
        "Project {} {} by {:?}, now {}",
        project.id,
        action.as_str(),
        session.user_id(),
        project.state().as_str()
    );

    audit(state.store.as_ref(), AuditEntity::Project(project.id), &session, action.audit_event(), None).await;

    Ok(ApiResponse::success(json!({ "status": "okay" })))
}
