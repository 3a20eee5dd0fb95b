use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Who a token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    /// A platform user; `sub` is the user id
    User,
    /// A running project's own token; `sub` is the project id
    Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub scope: TokenScope,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, scope: TokenScope, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            scope,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn for_user(user_id: Uuid, security: &SecurityConfig) -> Self {
        Self::new(user_id, TokenScope::User, security.jwt_expiry_hours)
    }

    pub fn for_project(project_id: Uuid, security: &SecurityConfig) -> Self {
        Self::new(project_id, TokenScope::Project, security.jwt_expiry_hours)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate JWT token and extract claims
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}
