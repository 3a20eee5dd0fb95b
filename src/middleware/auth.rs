use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{validate_jwt, TokenScope};
use crate::database::models::User;
use crate::error::ApiError;

/// Who is making the request
#[derive(Clone, Debug)]
pub enum Session {
    /// A platform user, loaded fresh from the store
    User(User),
    /// A project runtime calling back with its own token
    Project { owner_id: Uuid },
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::User(user) => Some(user),
            Session::Project { .. } => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|user| user.id)
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|user| user.admin).unwrap_or(false)
    }
}

/// JWT authentication middleware: validates the bearer token and injects
/// the resulting `Session` into the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.config.security).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::unauthorized(e.to_string())
    })?;

    let session = match claims.scope {
        TokenScope::User => {
            let user = state
                .store
                .user_by_id(claims.sub)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to load user {}: {}", claims.sub, e);
                    ApiError::unauthorized("Unable to verify user")
                })?
                .ok_or_else(|| {
                    tracing::warn!("Token for unknown user {}", claims.sub);
                    ApiError::unauthorized("Unknown user")
                })?;
            Session::User(user)
        }
        TokenScope::Project => Session::Project { owner_id: claims.sub },
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
