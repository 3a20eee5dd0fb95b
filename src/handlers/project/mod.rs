//! `/api/v1/project` handlers. Everything under `/:project_id` runs after
//! the project loader, so handlers receive a resolved `ProjectContext`.

pub mod actions;
pub mod audit_log;
pub mod create;
pub mod delete;
pub mod get;
pub mod logs;
pub mod settings;
pub mod update;

pub use actions::post as project_action;
pub use audit_log::get as project_audit_log;
pub use create::post as project_create;
pub use delete::delete as project_delete;
pub use get::get as project_get;
pub use logs::get as project_logs;
pub use settings::get as project_settings;
pub use update::put as project_update;

use serde_json::Value;

use crate::database::models::NewAuditEntry;
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::types::AuditEntity;

/// Names reserved for platform hostnames
pub const BANNED_NAMES: [&str; 10] = [
    "www", "node-red", "nodered", "forge", "support", "help", "accounts", "account", "status", "billing",
];

/// Rejects banned or already used project names
pub async fn check_name_available(store: &dyn Store, name: &str) -> Result<(), ApiError> {
    if BANNED_NAMES.contains(&name) {
        return Err(ApiError::conflict("name not allowed"));
    }
    if store.count_projects_by_name(name).await? != 0 {
        return Err(ApiError::conflict("name in use"));
    }
    Ok(())
}

/// Write an audit entry. Failures are logged, never surfaced.
pub async fn audit(store: &dyn Store, entity: AuditEntity, session: &Session, event: &str, body: Option<Value>) {
    let mut entry = NewAuditEntry::new(entity, session.user_id(), event);
    if let Some(body) = body {
        entry = entry.with_body(body);
    }
    if let Err(e) = store.record_audit(entry).await {
        tracing::error!("Failed to record audit event {} for {}: {}", event, entity.entity_id(), e);
    }
}
