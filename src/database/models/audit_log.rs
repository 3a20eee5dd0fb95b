use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::AuditEntity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: Option<Uuid>,
    /// Joined from users, absent for deleted users
    pub username: Option<String>,
    pub event: String,
    pub body: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub entity: AuditEntity,
    pub user_id: Option<Uuid>,
    pub event: String,
    pub body: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(entity: AuditEntity, user_id: Option<Uuid>, event: impl Into<String>) -> Self {
        Self {
            entity,
            user_id,
            event: event.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
