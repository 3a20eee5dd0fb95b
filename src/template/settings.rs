use serde_json::{Map, Value};

use super::path::{get_template_value, set_template_value};
use super::{check_value, default_value, TEMPLATE_FIELDS};
use crate::error::FieldErrors;

#[derive(Debug, thiserror::Error)]
#[error("invalid settings: {field_errors:?}")]
pub struct SettingsError {
    pub field_errors: FieldErrors,
}

/// Whether projects may override `field`. Anything other than an explicit
/// `true` in the template policy counts as locked.
pub fn policy_allows(policy: &Value, field: &str) -> bool {
    matches!(get_template_value(policy, field), Some(Value::Bool(true)))
}

/// Check a project's settings update against its template.
///
/// Only template fields are kept; everything else in `input` is dropped.
/// Returns the accepted settings, nested.
pub fn validate_settings(policy: &Value, input: &Value) -> Result<Value, SettingsError> {
    let mut field_errors = FieldErrors::new();

    if !input.is_object() {
        field_errors.insert("settings".to_string(), "Invalid value".to_string());
        return Err(SettingsError { field_errors });
    }

    let mut accepted = Value::Object(Map::new());
    for field in TEMPLATE_FIELDS {
        let Some(value) = get_template_value(input, field) else {
            continue;
        };

        if !policy_allows(policy, field) {
            field_errors.insert(
                field.to_string(),
                "Setting is locked by the project template".to_string(),
            );
        } else if let Some(message) = check_value(field, value) {
            field_errors.insert(field.to_string(), message);
        } else {
            set_template_value(&mut accepted, field, value.clone());
        }
    }

    if field_errors.is_empty() {
        Ok(accepted)
    } else {
        Err(SettingsError { field_errors })
    }
}

/// Settings a running project sees: project override where the policy
/// allows one, then the template value, then the default.
pub fn runtime_settings(template_settings: &Value, policy: &Value, project_settings: Option<&Value>) -> Value {
    let mut resolved = Value::Object(Map::new());

    for field in TEMPLATE_FIELDS {
        let from_project = project_settings
            .filter(|_| policy_allows(policy, field))
            .and_then(|settings| get_template_value(settings, field));

        let value = from_project
            .or_else(|| get_template_value(template_settings, field))
            .cloned()
            .or_else(|| default_value(field));

        if let Some(value) = value {
            set_template_value(&mut resolved, field, value);
        }
    }

    resolved
}
