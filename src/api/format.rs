//! Public JSON shapes for the control plane's resources.

use serde_json::{json, Value};

use crate::containers::ContainerDetails;
use crate::database::models::{AuditLogEntry, ProjectDetail, ProjectStack, ProjectTemplate, Team};

pub fn team_view(team: &Team) -> Value {
    json!({
        "id": team.id,
        "name": team.name,
        "slug": team.slug,
        "createdAt": team.created_at,
    })
}

pub fn stack_view(stack: &ProjectStack) -> Value {
    json!({
        "id": stack.id,
        "name": stack.name,
        "active": stack.active,
        "properties": stack.properties,
    })
}

pub fn template_view(template: &ProjectTemplate) -> Value {
    json!({
        "id": template.id,
        "name": template.name,
        "active": template.active,
        "description": template.description,
        "settings": template.settings,
        "policy": template.policy,
        "createdAt": template.created_at,
        "updatedAt": template.updated_at,
    })
}

fn template_summary(template: &ProjectTemplate) -> Value {
    json!({
        "id": template.id,
        "name": template.name,
        "description": template.description,
    })
}

/// A project with its team, stack and template expanded
pub fn project_view(detail: &ProjectDetail) -> Value {
    let project = &detail.project;
    json!({
        "id": project.id,
        "name": project.name,
        "type": project.project_type,
        "url": project.url,
        "state": project.state,
        "createdAt": project.created_at,
        "updatedAt": project.updated_at,
        "team": team_view(&detail.team),
        "stack": detail.stack.as_ref().map(stack_view),
        "template": detail.template.as_ref().map(template_summary),
    })
}

/// Project view with the driver's live details under `meta`
pub fn project_with_meta(detail: &ProjectDetail, details: Option<ContainerDetails>) -> Value {
    let mut view = project_view(detail);
    let meta = details.unwrap_or_else(ContainerDetails::unknown);
    view["meta"] = serde_json::to_value(meta).unwrap_or_else(|_| json!({ "state": "unknown" }));
    view
}

fn audit_entry_view(entry: &AuditLogEntry) -> Value {
    json!({
        "id": entry.id,
        "createdAt": entry.created_at,
        "entityType": entry.entity_type,
        "entityId": entry.entity_id,
        "event": entry.event,
        "body": entry.body,
        "username": entry.username,
    })
}

/// A page of audit entries, newest first. `next_cursor` is only set when
/// the page is full, so a short page marks the end.
pub fn audit_log_view(entries: &[AuditLogEntry], limit: usize) -> Value {
    let next_cursor = if entries.len() >= limit {
        entries.last().map(|entry| entry.id.to_string())
    } else {
        None
    };

    let mut meta = json!({});
    if let Some(cursor) = next_cursor {
        meta["next_cursor"] = json!(cursor);
    }

    json!({
        "meta": meta,
        "log": entries.iter().map(audit_entry_view).collect::<Vec<_>>(),
    })
}
