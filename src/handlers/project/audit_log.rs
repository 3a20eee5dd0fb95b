use axum::{
    extract::{Query, State},
    Extension,
};
use serde_json::Value;

use crate::api::{audit_log_view, PageQuery, PaginationOptions};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext, Session};
use crate::permissions::{needs_permission, Permission};

/// GET /api/v1/project/:project_id/audit-log - Newest first; `cursor` is
/// the id of the last entry already seen
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(ctx): Extension<ProjectContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Value> {
    needs_permission(&session, ctx.membership.as_ref(), Permission::ProjectAuditLog)?;

    let options = PaginationOptions::from_query(&query, &state.config.pagination);
    let before = options
        .cursor
        .as_deref()
        .map(|c| c.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid cursor")))
        .transpose()?;

    let entries = state
        .store
        .audit_for_project(ctx.project.project.id, before, options.limit)
        .await?;
    Ok(ApiResponse::success(audit_log_view(&entries, options.limit)))
}
