use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::path::{get_template_value, set_template_value};
use super::{check_value, default_value, is_template_field, TemplateDocument, TEMPLATE_FIELDS};
use crate::error::FieldErrors;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TemplateError {
    #[error("unknown template field: {0}")]
    UnknownField(String),
}

/// Flat view of a template: one entry per field in `TEMPLATE_FIELDS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    pub name: String,
    pub active: bool,
    pub description: String,
    pub settings: Map<String, Value>,
    /// `true` lets projects override the field; `false` locks it
    pub policy: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangedFlags {
    pub name: bool,
    pub active: bool,
    pub description: bool,
    pub settings: BTreeMap<String, bool>,
    pub policy: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableTemplate {
    #[serde(flatten)]
    pub values: TemplateSnapshot,
    pub changed: ChangedFlags,
    pub errors: FieldErrors,
}

/// Edit state for a template: the working copy plus the snapshot it
/// started from. Every setter recomputes that field's `changed` flag and
/// validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEdit {
    pub editable: EditableTemplate,
    pub original: TemplateSnapshot,
}

impl TemplateEdit {
    /// Flatten a stored template for editing. Fields the template does not
    /// set take their default; fields without a policy entry are locked.
    pub fn prepare(template: &TemplateDocument) -> Self {
        let mut settings = Map::new();
        let mut policy = BTreeMap::new();
        let mut changed = ChangedFlags::default();

        for field in TEMPLATE_FIELDS {
            let value = get_template_value(&template.settings, field)
                .cloned()
                .or_else(|| default_value(field))
                .unwrap_or(Value::Null);
            settings.insert(field.to_string(), value);
            changed.settings.insert(field.to_string(), false);

            let editable = get_template_value(&template.policy, field)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            policy.insert(field.to_string(), editable);
            changed.policy.insert(field.to_string(), false);
        }

        let snapshot = TemplateSnapshot {
            name: template.name.clone(),
            active: template.active,
            description: template.description.clone(),
            settings,
            policy,
        };

        Self {
            editable: EditableTemplate {
                values: snapshot.clone(),
                changed,
                errors: FieldErrors::new(),
            },
            original: snapshot,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name.trim().is_empty() {
            self.editable.errors.insert("name".to_string(), "Name is required".to_string());
        } else {
            self.editable.errors.remove("name");
        }
        self.editable.changed.name = name != self.original.name;
        self.editable.values.name = name;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.editable.changed.description = description != self.original.description;
        self.editable.values.description = description;
    }

    pub fn set_active(&mut self, active: bool) {
        self.editable.changed.active = active != self.original.active;
        self.editable.values.active = active;
    }

    pub fn set_setting(&mut self, field: &str, value: Value) -> Result<(), TemplateError> {
        if !is_template_field(field) {
            return Err(TemplateError::UnknownField(field.to_string()));
        }

        match check_value(field, &value) {
            Some(message) => self.editable.errors.insert(field.to_string(), message),
            None => self.editable.errors.remove(field),
        };

        let changed = self.original.settings.get(field) != Some(&value);
        self.editable.changed.settings.insert(field.to_string(), changed);
        self.editable.values.settings.insert(field.to_string(), value);
        Ok(())
    }

    pub fn set_policy(&mut self, field: &str, editable: bool) -> Result<(), TemplateError> {
        if !is_template_field(field) {
            return Err(TemplateError::UnknownField(field.to_string()));
        }

        let changed = self.original.policy.get(field) != Some(&editable);
        self.editable.changed.policy.insert(field.to_string(), changed);
        self.editable.values.policy.insert(field.to_string(), editable);
        Ok(())
    }

    pub fn is_changed(&self) -> bool {
        let changed = &self.editable.changed;
        changed.name
            || changed.active
            || changed.description
            || changed.settings.values().any(|c| *c)
            || changed.policy.values().any(|c| *c)
    }

    pub fn has_errors(&self) -> bool {
        !self.editable.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.editable.errors
    }

    /// Fold the working copy back into nested settings and policy
    pub fn into_update(self) -> TemplateDocument {
        let values = self.editable.values;
        let mut settings = Value::Object(Map::new());
        for (field, value) in values.settings {
            set_template_value(&mut settings, &field, value);
        }
        let mut policy = Value::Object(Map::new());
        for (field, editable) in values.policy {
            set_template_value(&mut policy, &field, Value::Bool(editable));
        }

        TemplateDocument {
            name: values.name,
            active: values.active,
            description: values.description,
            settings,
            policy,
        }
    }
}

/// Free-function form of [`TemplateEdit::prepare`]
pub fn prepare_template_for_edit(template: &TemplateDocument) -> TemplateEdit {
    TemplateEdit::prepare(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> TemplateDocument {
        TemplateDocument {
            name: "starter".to_string(),
            active: true,
            description: "Starter template".to_string(),
            settings: json!({ "disableEditor": true, "palette": { "nodesExcludes": "exec.js" } }),
            policy: json!({ "palette": { "allowInstall": true } }),
        }
    }

    #[test]
    fn prepare_fills_defaults_and_locks() {
        let edit = TemplateEdit::prepare(&document());
        let values = &edit.editable.values;

        assert_eq!(values.settings["disableEditor"], true);
        assert_eq!(values.settings["palette_nodesExcludes"], "exec.js");
        assert_eq!(values.settings["codeEditor"], "monaco");
        assert_eq!(values.settings["modules_allowInstall"], true);

        assert_eq!(values.policy["palette_allowInstall"], true);
        assert_eq!(values.policy["disableEditor"], false);

        assert_eq!(edit.original, edit.editable.values);
        assert!(!edit.is_changed());
        assert!(!edit.has_errors());
        assert!(edit.editable.changed.settings.values().all(|c| !c));
    }

    #[test]
    fn changed_flag_tracks_original() {
        let mut edit = TemplateEdit::prepare(&document());

        edit.set_setting("codeEditor", json!("ace")).unwrap();
        assert!(edit.editable.changed.settings["codeEditor"]);
        assert!(edit.is_changed());

        edit.set_setting("codeEditor", json!("monaco")).unwrap();
        assert!(!edit.editable.changed.settings["codeEditor"]);
        assert!(!edit.is_changed());

        edit.set_policy("disableEditor", true).unwrap();
        assert!(edit.editable.changed.policy["disableEditor"]);
        edit.set_active(false);
        assert!(edit.editable.changed.active);
    }

    #[test]
    fn setters_validate() {
        let mut edit = TemplateEdit::prepare(&document());

        edit.set_setting("httpAdminRoot", json!("/bad path")).unwrap();
        assert_eq!(edit.errors()["httpAdminRoot"], "Must contain only 0-9 a-z _ - /");

        edit.set_setting("httpAdminRoot", json!("/admin")).unwrap();
        assert!(!edit.has_errors());

        edit.set_name("  ");
        assert!(edit.errors().contains_key("name"));

        assert_eq!(
            edit.set_setting("httpNodeRoot", json!("/")),
            Err(TemplateError::UnknownField("httpNodeRoot".to_string()))
        );
    }

    #[test]
    fn into_update_nests_fields() {
        let mut edit = TemplateEdit::prepare(&document());
        edit.set_setting("palette_allowInstall", json!(false)).unwrap();
        edit.set_policy("modules_allowInstall", true).unwrap();

        let doc = edit.into_update();
        assert_eq!(doc.settings["palette"]["allowInstall"], false);
        assert_eq!(doc.settings["palette"]["nodesExcludes"], "exec.js");
        assert_eq!(doc.settings["disableEditor"], true);
        assert_eq!(doc.policy["modules"]["allowInstall"], true);
        assert_eq!(doc.policy["disableEditor"], false);
    }

    #[test]
    fn serializes_with_flat_editable_values() {
        let edit = prepare_template_for_edit(&document());
        let value = serde_json::to_value(&edit).unwrap();
        assert_eq!(value["editable"]["name"], "starter");
        assert_eq!(value["editable"]["changed"]["name"], false);
        assert_eq!(value["original"]["settings"]["codeEditor"], "monaco");
    }
}
