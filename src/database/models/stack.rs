use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A runtime stack (Node-RED version, memory, cpu...) a project runs on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectStack {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub properties: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStack {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "empty_object")]
    pub properties: Value,
}

fn default_active() -> bool {
    true
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}
