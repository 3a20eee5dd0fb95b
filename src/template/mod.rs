//! Project templates: the fields a template controls, their defaults and
//! validators, plus the helpers for editing a template and resolving the
//! settings a running project ends up with.
//!
//! Template settings and policy are stored nested (`palette.allowInstall`)
//! but addressed by flat, underscore-delimited paths (`palette_allowInstall`).

mod edit;
mod path;
mod settings;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::database::models::ProjectTemplate;

pub use edit::{
    prepare_template_for_edit, ChangedFlags, EditableTemplate, TemplateEdit, TemplateError, TemplateSnapshot,
};
pub use path::{get_template_value, set_template_value};
pub use settings::{policy_allows, runtime_settings, validate_settings, SettingsError};

pub const TEMPLATE_FIELDS: [&str; 6] = [
    "disableEditor",
    "httpAdminRoot",
    "codeEditor",
    "palette_allowInstall",
    "palette_nodesExcludes",
    "modules_allowInstall",
];

static HTTP_ADMIN_ROOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[0-9a-z_\-\\/]*$").unwrap());
static NODE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9\-._]+\.js$").unwrap());

pub fn is_template_field(field: &str) -> bool {
    TEMPLATE_FIELDS.contains(&field)
}

/// Value a field takes when neither the template nor the project sets it
pub fn default_value(field: &str) -> Option<Value> {
    let value = match field {
        "disableEditor" => json!(false),
        "httpAdminRoot" => json!(""),
        "codeEditor" => json!("monaco"),
        "palette_allowInstall" => json!(true),
        "palette_nodesExcludes" => json!(""),
        "modules_allowInstall" => json!(true),
        _ => return None,
    };
    Some(value)
}

/// All defaults keyed by flat field name
pub fn default_template_values() -> Map<String, Value> {
    TEMPLATE_FIELDS
        .iter()
        .filter_map(|field| default_value(field).map(|v| (field.to_string(), v)))
        .collect()
}

/// Field-specific format checks. Returns the message to show, if any.
pub fn validate_field(field: &str, value: &Value) -> Option<String> {
    let text = value.as_str()?;
    match field {
        "httpAdminRoot" if !HTTP_ADMIN_ROOT.is_match(text) => {
            Some("Must contain only 0-9 a-z _ - /".to_string())
        }
        "palette_nodesExcludes" => {
            if text.trim().is_empty() {
                return None;
            }
            let all_js = text
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .all(|name| NODE_FILENAME.is_match(name));
            if all_js {
                None
            } else {
                Some("Must be a comma-separated list of .js filenames".to_string())
            }
        }
        _ => None,
    }
}

/// Type check against the default, then the field validator
pub fn check_value(field: &str, value: &Value) -> Option<String> {
    match default_value(field) {
        Some(default) if !same_kind(&default, value) => Some("Invalid value".to_string()),
        _ => validate_field(field, value),
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// The editable parts of a template, as exchanged with clients and files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub settings: Value,
    #[serde(default = "empty_object")]
    pub policy: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl From<&ProjectTemplate> for TemplateDocument {
    fn from(template: &ProjectTemplate) -> Self {
        Self {
            name: template.name.clone(),
            active: template.active,
            description: template.description.clone(),
            settings: template.settings.clone(),
            policy: template.policy.clone(),
        }
    }
}
