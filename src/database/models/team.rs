use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::permissions::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMembership {
    pub user_id: Uuid,
    pub team_id: Uuid,
    /// Stored role level, see [`Role::level`]
    pub role: i32,
}

impl TeamMembership {
    pub fn role(&self) -> Role {
        Role::from_level(self.role)
    }
}
