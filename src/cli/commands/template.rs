use clap::Subcommand;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::utils::{output_success, output_value, parse_assignment};
use crate::cli::OutputFormat;
use crate::template::{default_template_values, TemplateDocument, TemplateEdit};

#[derive(Subcommand)]
pub enum TemplateCommands {
    #[command(about = "Print the default value of every template field")]
    Defaults,

    #[command(about = "Show the flattened edit state of a template file (JSON or YAML)")]
    Show {
        #[arg(help = "Template file")]
        file: PathBuf,
    },

    #[command(about = "Edit a template file, validating every change")]
    Edit {
        #[arg(help = "Template file")]
        file: PathBuf,
        #[arg(long, help = "New template name")]
        name: Option<String>,
        #[arg(long, help = "New description")]
        description: Option<String>,
        #[arg(long, help = "Whether the template is offered to new projects")]
        active: Option<bool>,
        #[arg(long = "set", help = "Setting as field=value (repeatable)")]
        settings: Vec<String>,
        #[arg(long, help = "Let projects override this field (repeatable)")]
        allow: Vec<String>,
        #[arg(long, help = "Lock this field to the template value (repeatable)")]
        lock: Vec<String>,
        #[arg(long, help = "Write the result here instead of over the input file")]
        output: Option<PathBuf>,
    },
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

pub fn read_document(path: &Path) -> anyhow::Result<TemplateDocument> {
    let content = fs::read_to_string(path)?;
    let document = if is_yaml(path) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(document)
}

pub fn write_document(path: &Path, document: &TemplateDocument) -> anyhow::Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(document)?
    } else {
        serde_json::to_string_pretty(document)?
    };
    fs::write(path, content)?;
    Ok(())
}

pub async fn handle(cmd: TemplateCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TemplateCommands::Defaults => output_value(&output_format, &Value::Object(default_template_values())),
        TemplateCommands::Show { file } => {
            let edit = TemplateEdit::prepare(&read_document(&file)?);
            output_value(&output_format, &serde_json::to_value(&edit)?)
        }
        TemplateCommands::Edit { file, name, description, active, settings, allow, lock, output } => {
            let mut edit = TemplateEdit::prepare(&read_document(&file)?);

            if let Some(name) = name {
                edit.set_name(name);
            }
            if let Some(description) = description {
                edit.set_description(description);
            }
            if let Some(active) = active {
                edit.set_active(active);
            }
            for assignment in &settings {
                let (field, value) = parse_assignment(assignment)?;
                edit.set_setting(&field, value)?;
            }
            for field in &allow {
                edit.set_policy(field, true)?;
            }
            for field in &lock {
                edit.set_policy(field, false)?;
            }

            if edit.has_errors() {
                let errors = edit
                    .errors()
                    .iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect::<Vec<_>>()
                    .join(", ");
                anyhow::bail!("invalid template: {}", errors);
            }

            if !edit.is_changed() {
                return output_success(&output_format, "No changes", None);
            }

            let target = output.unwrap_or(file);
            let document = edit.into_update();
            write_document(&target, &document)?;
            output_success(
                &output_format,
                &format!("Wrote {}", target.display()),
                Some(json!({ "path": target.display().to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_and_json_files_round_trip() {
        let dir = std::env::temp_dir().join(format!("ffctl-template-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let document = TemplateDocument {
            name: "starter".to_string(),
            active: true,
            description: "Starter".to_string(),
            settings: json!({ "palette": { "allowInstall": false } }),
            policy: json!({ "httpAdminRoot": true }),
        };

        for name in ["template.yaml", "template.json"] {
            let path = dir.join(name);
            write_document(&path, &document).unwrap();
            assert_eq!(read_document(&path).unwrap(), document);
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
