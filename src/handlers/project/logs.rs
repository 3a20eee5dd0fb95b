use axum::{
    extract::{Query, State},
    Extension,
};

use crate::api::{paginate_logs, LogPage, PageQuery, PaginationOptions};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, ProjectContext};

/// GET /api/v1/project/:project_id/logs - Page through the runtime log
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<LogPage> {
    let options = PaginationOptions::from_query(&query, &state.config.pagination);
    let logs = state.containers.logs(&ctx.project.project).await?;
    Ok(ApiResponse::success(paginate_logs(&logs, &options)))
}
