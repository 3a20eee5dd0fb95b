use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::template_view;
use crate::app::AppState;
use crate::database::models::{NewTemplate, ProjectTemplate};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::permissions::needs_admin;
use crate::template::{check_value, get_template_value, TemplateDocument, TemplateEdit, TEMPLATE_FIELDS};

type JsonBody<T> = Result<Json<T>, axum::extract::rejection::JsonRejection>;

/// Flat edits to a template, keyed the way `TemplateEdit` addresses fields
#[derive(Debug, Default, Deserialize)]
pub struct TemplateUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub settings: Option<Map<String, Value>>,
    pub policy: Option<Map<String, Value>>,
}

async fn load(state: &AppState, id: &str) -> Result<ProjectTemplate, ApiError> {
    let id = Uuid::parse_str(id).map_err(|_| ApiError::not_found("Not Found"))?;
    state
        .store
        .template_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not Found"))
}

/// GET /api/v1/templates - All templates
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let templates = state.store.list_templates().await?;
    Ok(ApiResponse::success(json!({
        "templates": templates.iter().map(template_view).collect::<Vec<_>>(),
        "count": templates.len(),
    })))
}

/// GET /api/v1/templates/:id - A template and its flattened edit state
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let template = load(&state, &id).await?;
    let edit = TemplateEdit::prepare(&TemplateDocument::from(&template));
    Ok(ApiResponse::success(json!({
        "template": template_view(&template),
        "edit": edit,
    })))
}

/// POST /api/v1/templates - Create a template (admin)
pub async fn post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: JsonBody<NewTemplate>,
) -> ApiResult<Value> {
    needs_admin(&session)?;
    let Json(mut template) = body?;

    let errors = new_template_errors(&template);
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid template", Some(errors)));
    }

    template.owner_id = session.user_id();
    let created = state.store.create_template(template).await?;
    tracing::info!("Created template {} ({})", created.name, created.id);
    Ok(ApiResponse::created(template_view(&created)))
}

/// Everything wrong with a template submitted whole. Settings must be an
/// object of valid field values; policy an object whose leaves are booleans.
fn new_template_errors(template: &NewTemplate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if template.name.trim().is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }

    if template.settings.is_object() {
        for field in TEMPLATE_FIELDS {
            if let Some(message) = get_template_value(&template.settings, field).and_then(|v| check_value(field, v)) {
                errors.insert(field.to_string(), message);
            }
        }
    } else {
        errors.insert("settings".to_string(), "Must be an object".to_string());
    }

    if template.policy.is_object() {
        policy_leaf_errors(&template.policy, "", &mut errors);
    } else {
        errors.insert("policy".to_string(), "Must be an object".to_string());
    }
    errors
}

fn policy_leaf_errors(node: &Value, path: &str, errors: &mut FieldErrors) {
    match node {
        Value::Object(children) => {
            for (key, child) in children {
                let child_path = if path.is_empty() { key.clone() } else { format!("{}_{}", path, key) };
                policy_leaf_errors(child, &child_path, errors);
            }
        }
        Value::Bool(_) => {}
        _ => {
            errors.insert(format!("policy_{}", path), "Invalid value".to_string());
        }
    }
}

/// PUT /api/v1/templates/:id - Apply flat edits to a template (admin)
pub async fn put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: JsonBody<TemplateUpdateRequest>,
) -> ApiResult<Value> {
    needs_admin(&session)?;
    let Json(body) = body?;
    let mut template = load(&state, &id).await?;

    let mut edit = TemplateEdit::prepare(&TemplateDocument::from(&template));
    let mut errors = apply_edits(&mut edit, body);
    errors.extend(edit.errors().clone());
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid template", Some(errors)));
    }

    if !edit.is_changed() {
        return Ok(ApiResponse::success(template_view(&template)));
    }

    let update = edit.into_update();
    template.name = update.name;
    template.description = update.description;
    template.active = update.active;
    template.settings = update.settings;
    template.policy = update.policy;

    let saved = state.store.update_template(&template).await?;
    tracing::info!("Updated template {} ({})", saved.name, saved.id);
    Ok(ApiResponse::success(template_view(&saved)))
}

/// Feed request edits into the edit state. Returns errors the edit state
/// itself cannot record (unknown fields, non-boolean policy values).
fn apply_edits(edit: &mut TemplateEdit, body: TemplateUpdateRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(name) = body.name {
        edit.set_name(name);
    }
    if let Some(description) = body.description {
        edit.set_description(description);
    }
    if let Some(active) = body.active {
        edit.set_active(active);
    }

    for (field, value) in body.settings.unwrap_or_default() {
        if edit.set_setting(&field, value).is_err() {
            errors.insert(field, "Unknown setting".to_string());
        }
    }

    for (field, value) in body.policy.unwrap_or_default() {
        let Some(editable) = value.as_bool() else {
            errors.insert(format!("policy_{}", field), "Invalid value".to_string());
            continue;
        };
        if edit.set_policy(&field, editable).is_err() {
            errors.insert(format!("policy_{}", field), "Unknown setting".to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit() -> TemplateEdit {
        TemplateEdit::prepare(&TemplateDocument {
            name: "starter".to_string(),
            active: true,
            description: String::new(),
            settings: json!({}),
            policy: json!({}),
        })
    }

    #[test]
    fn unknown_fields_are_reported() {
        let mut edit = edit();
        let mut settings = Map::new();
        settings.insert("httpNodeRoot".to_string(), json!("/"));
        let mut policy = Map::new();
        policy.insert("codeEditor".to_string(), json!("yes"));

        let errors = apply_edits(
            &mut edit,
            TemplateUpdateRequest { settings: Some(settings), policy: Some(policy), ..Default::default() },
        );
        assert_eq!(errors["httpNodeRoot"], "Unknown setting");
        assert_eq!(errors["policy_codeEditor"], "Invalid value");
        assert!(!edit.is_changed());
    }

    fn new_template(settings: Value, policy: Value) -> NewTemplate {
        NewTemplate {
            name: "junk".to_string(),
            description: String::new(),
            active: true,
            settings,
            policy,
            owner_id: None,
        }
    }

    #[test]
    fn new_templates_need_object_settings_and_boolean_policy() {
        let errors = new_template_errors(&new_template(json!("not-an-object"), json!({ "httpAdminRoot": "yes" })));
        assert_eq!(errors["settings"], "Must be an object");
        assert_eq!(errors["policy_httpAdminRoot"], "Invalid value");

        let errors = new_template_errors(&new_template(json!({}), json!({ "palette": { "allowInstall": 1 } })));
        assert_eq!(errors["policy_palette_allowInstall"], "Invalid value");

        let errors = new_template_errors(&new_template(json!({}), json!([true])));
        assert_eq!(errors["policy"], "Must be an object");

        let errors = new_template_errors(&new_template(
            json!({ "codeEditor": "ace" }),
            json!({ "httpAdminRoot": true, "palette": { "allowInstall": false } }),
        ));
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn valid_edits_mark_changes() {
        let mut edit = edit();
        let mut policy = Map::new();
        policy.insert("httpAdminRoot".to_string(), json!(true));

        let errors = apply_edits(
            &mut edit,
            TemplateUpdateRequest { description: Some("Updated".to_string()), policy: Some(policy), ..Default::default() },
        );
        assert!(errors.is_empty());
        assert!(edit.editable.changed.description);
        assert!(edit.editable.changed.policy["httpAdminRoot"]);
    }
}
