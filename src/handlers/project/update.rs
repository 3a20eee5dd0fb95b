use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::check_name_available;
use crate::api::{project_with_meta, team_view};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext, Session};
use crate::permissions::{needs_permission, Permission};
use crate::template::validate_settings;

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub settings: Option<Value>,
}

/// PUT /api/v1/project/:project_id - Rename a project or change its settings
pub async fn put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(ctx): Extension<ProjectContext>,
    body: Result<Json<UpdateProjectRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<Value> {
    needs_permission(&session, ctx.membership.as_ref(), Permission::ProjectEdit)?;
    let Json(body) = body?;

    let mut detail = ctx.project;

    // Validate everything before writing anything
    let settings = match body.settings {
        Some(settings) => {
            let policy = detail
                .template
                .as_ref()
                .map(|t| t.policy.clone())
                .unwrap_or_else(|| json!({}));
            Some(validate_settings(&policy, &settings)?)
        }
        None => None,
    };

    if let Some(name) = body.name.filter(|n| !n.is_empty()) {
        if name != detail.project.name {
            check_name_available(state.store.as_ref(), &name).await?;
            detail.project.name = name;
        }
    }

    if let Some(settings) = settings {
        state
            .store
            .set_project_setting(detail.project.id, "settings", settings)
            .await?;
    }
    detail.project = state.store.update_project(&detail.project).await?;
    tracing::info!("Updated project {} ({})", detail.project.name, detail.project.id);

    let details = state.containers.details(&detail.project).await?;
    let mut result = project_with_meta(&detail, details);
    result["team"] = team_view(&detail.team);
    Ok(ApiResponse::success(result))
}

