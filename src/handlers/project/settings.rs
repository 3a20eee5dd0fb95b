use axum::{extract::State, Extension};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext};
use crate::template::runtime_settings;

/// GET /api/v1/project/:project_id/settings - Everything a runtime needs to
/// boot: driver settings, control plane URLs and resolved template settings.
/// Reachable with the project's own token.
pub async fn get(State(state): State<AppState>, Extension(ctx): Extension<ProjectContext>) -> ApiResult<Map<String, Value>> {
    let detail = &ctx.project;
    let project = &detail.project;
    let (mut settings, overrides) = futures::try_join!(
        async { state.containers.settings(project).await.map_err(ApiError::from) },
        async { state.store.project_setting(project.id, "settings").await.map_err(ApiError::from) },
    )?;

    let (template_settings, policy) = match &detail.template {
        Some(template) => (template.settings.clone(), template.policy.clone()),
        None => (json!({}), json!({})),
    };

    settings.insert("baseURL".to_string(), json!(project.url));
    settings.insert("forgeURL".to_string(), json!(state.config.server.base_url));
    settings.insert("storageURL".to_string(), json!(state.config.storage_url()));
    settings.insert("auditURL".to_string(), json!(state.config.audit_url()));
    settings.insert("state".to_string(), json!(project.state));
    settings.insert(
        "stack".to_string(),
        detail
            .stack
            .as_ref()
            .map(|s| s.properties.clone())
            .unwrap_or_else(|| json!({})),
    );
    settings.insert(
        "settings".to_string(),
        runtime_settings(&template_settings, &policy, overrides.as_ref()),
    );

    Ok(ApiResponse::success(settings))
}
