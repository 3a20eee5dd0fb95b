use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::auth::Session;
use crate::app::AppState;
use crate::database::models::{ProjectDetail, TeamMembership};
use crate::error::ApiError;

/// The project named in the route, resolved for the current session
#[derive(Clone, Debug)]
pub struct ProjectContext {
    pub project: ProjectDetail,
    /// The caller's membership in the project's team, if any
    pub membership: Option<TeamMembership>,
}

/// Resolves `:project_id` before any project handler runs. Every failure
/// answers 404 so callers cannot probe for projects they cannot see.
pub async fn load_project(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let context = resolve(&state, &session, params.get("project_id").map(String::as_str))
        .await
        .ok_or_else(|| ApiError::not_found("Not Found"))?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

async fn resolve(state: &AppState, session: &Session, raw_id: Option<&str>) -> Option<ProjectContext> {
    let project_id = Uuid::parse_str(raw_id?).ok()?;

    let project = match state.store.project_by_id(project_id).await {
        Ok(found) => found?,
        Err(e) => {
            tracing::error!("Failed to load project {}: {}", project_id, e);
            return None;
        }
    };

    match session {
        Session::User(user) => {
            let membership = match state.store.team_membership(user.id, project.team.id).await {
                Ok(membership) => membership,
                Err(e) => {
                    tracing::error!("Failed to load membership for {}: {}", user.username, e);
                    return None;
                }
            };
            if membership.is_none() && !user.admin {
                tracing::debug!("User {} is not in team {}", user.username, project.team.id);
                return None;
            }
            Some(ProjectContext { project, membership })
        }
        Session::Project { owner_id } if *owner_id == project_id => Some(ProjectContext {
            project,
            membership: None,
        }),
        Session::Project { .. } => None,
    }
}
