use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{audit, check_name_available};
use crate::api::project_view;
use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::containers::CreateOptions;
use crate::database::models::{NewProject, Project};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::permissions::{needs_permission, Permission};
use crate::types::AuditEntity;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    /// Team id; clients send it as a string or a number
    pub team: Option<Value>,
    pub stack: Option<String>,
    pub template: Option<String>,
    pub options: Option<Value>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("body must have required property '{}'", field)))
}

fn team_key(team: &Value) -> Option<String> {
    match team {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// POST /api/v1/project - Create a project in one of the caller's teams
pub async fn post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<CreateProjectRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = body?;
    let name = required(body.name, "name")?;
    let team = required(body.team.as_ref().and_then(team_key), "team")?;
    let stack_id = required(body.stack, "stack")?;
    let template_id = required(body.template, "template")?;
    let options = required(body.options, "options")?;
    if !options.is_object() {
        return Err(ApiError::bad_request("body/options must be object"));
    }

    let user = session
        .user()
        .ok_or_else(|| ApiError::unauthorized("Project tokens cannot create projects"))?;

    let membership = match Uuid::parse_str(&team) {
        Ok(team_id) => state.store.team_membership(user.id, team_id).await?,
        Err(_) => None,
    };
    let Some(membership) = membership else {
        return Err(ApiError::unauthorized(format!("Current user not in team {}", team)));
    };
    needs_permission(&session, Some(&membership), Permission::ProjectCreate)?;

    let stack = match Uuid::parse_str(&stack_id) {
        Ok(id) => state.store.stack_by_id(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::bad_request("Invalid stack"))?;

    let template = match Uuid::parse_str(&template_id) {
        Ok(id) => state.store.template_by_id(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::bad_request("Invalid template"))?;

    check_name_available(state.store.as_ref(), &name).await?;

    let mut project = state
        .store
        .create_project(NewProject {
            name,
            team_id: membership.team_id,
            stack_id: stack.id,
            template_id: template.id,
        })
        .await?;

    let token = generate_jwt(&Claims::for_project(project.id, &state.config.security), &state.config.security)
        .map_err(|e| {
            tracing::error!("Failed to issue project token: {}", e);
            ApiError::internal_server_error("Failed to issue project token")
        })?;

    let create_options = CreateOptions { token, options };
    if let Err(e) = launch(&state, &mut project, &create_options).await {
        rollback(&state, &project).await;
        return Err(e);
    }
    tracing::info!("Created project {} ({}) in team {}", project.name, project.id, project.team_id);

    audit(state.store.as_ref(), AuditEntity::Project(project.id), &session, "project.created", None).await;
    audit(
        state.store.as_ref(),
        AuditEntity::Team(project.team_id),
        &session,
        "project.created",
        Some(json!({ "id": project.id, "name": project.name })),
    )
    .await;

    let detail = state
        .store
        .project_by_id(project.id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Project vanished after creation"))?;

    let mut result = project_view(&detail);
    result["team"] = json!(detail.team.id);
    Ok(ApiResponse::success(result))
}

/// Provision the container and record the URL the driver assigned
async fn launch(state: &AppState, project: &mut Project, options: &CreateOptions) -> Result<(), ApiError> {
    if let Some(url) = state.containers.create(project, options).await? {
        project.url = url;
        *project = state.store.update_project(project).await?;
    }
    Ok(())
}

/// Undo a half-created project so its name can be used again
async fn rollback(state: &AppState, project: &Project) {
    tracing::warn!("Launch failed for project {} ({}), rolling back", project.name, project.id);
    if let Err(e) = state.containers.remove(project).await {
        tracing::debug!("No container to remove for {}: {}", project.id, e);
    }
    if let Err(e) = state.store.delete_project(project.id).await {
        tracing::error!("Failed to delete project {} after launch failure: {}", project.id, e);
    }
}
