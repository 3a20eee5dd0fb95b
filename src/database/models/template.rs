use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// A named bundle of default project settings plus the policy saying which
/// of those settings a project may override.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectTemplate {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub description: String,
    pub settings: Value,
    pub policy: Value,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "empty_object")]
    pub settings: Value,
    #[serde(default = "empty_object")]
    pub policy: Value,
    #[serde(skip)]
    pub owner_id: Option<Uuid>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
