use clap::{Subcommand, ValueEnum};
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::load_cli_config;
use crate::cli::utils::{output_success, output_value, parse_assignment};
use crate::cli::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    #[command(about = "Create a project")]
    Create {
        #[arg(help = "Project name")]
        name: String,
        #[arg(long, help = "Team id")]
        team: String,
        #[arg(long, help = "Stack id")]
        stack: String,
        #[arg(long, help = "Template id")]
        template: String,
    },

    #[command(about = "Show a project and its container state")]
    Get {
        #[arg(help = "Project id")]
        id: String,
    },

    #[command(about = "Rename a project or change its settings")]
    Update {
        #[arg(help = "Project id")]
        id: String,
        #[arg(long, help = "New project name")]
        name: Option<String>,
        #[arg(long = "set", help = "Setting override as field=value (repeatable)")]
        settings: Vec<String>,
    },

    #[command(about = "Delete a project and its container")]
    Delete {
        #[arg(help = "Project id")]
        id: String,
    },

    #[command(about = "Show the runtime settings a project boots with")]
    Settings {
        #[arg(help = "Project id")]
        id: String,
    },

    #[command(about = "Page through a project's runtime log")]
    Logs {
        #[arg(help = "Project id")]
        id: String,
        #[arg(long, help = "Cursor from a previous page (prefix with - to go back)", allow_hyphen_values = true)]
        cursor: Option<String>,
        #[arg(long, help = "Entries per page")]
        limit: Option<usize>,
    },

    #[command(about = "Page through a project's audit log")]
    Audit {
        #[arg(help = "Project id")]
        id: String,
        #[arg(long, help = "Cursor from a previous page")]
        cursor: Option<String>,
        #[arg(long, help = "Entries per page")]
        limit: Option<usize>,
    },

    #[command(about = "Start, stop or restart a project")]
    Action {
        #[arg(help = "Project id")]
        id: String,
        #[arg(value_enum)]
        action: Action,
    },
}

fn page_query(cursor: Option<String>, limit: Option<usize>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(cursor) = &cursor {
        query.append_pair("cursor", cursor);
    }
    if let Some(limit) = limit {
        query.append_pair("limit", &limit.to_string());
    }
    match query.finish() {
        q if q.is_empty() => q,
        q => format!("?{}", q),
    }
}

/// Turn `field=value` pairs into a nested settings object
fn settings_from_assignments(assignments: &[String]) -> anyhow::Result<Value> {
    let mut settings = Value::Object(Map::new());
    for assignment in assignments {
        let (field, value) = parse_assignment(assignment)?;
        crate::template::set_template_value(&mut settings, &field, value);
    }
    Ok(settings)
}

pub async fn handle(cmd: ProjectCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_cli_config()?;
    let client = ApiClient::from_config(&config)?;

    match cmd {
        ProjectCommands::Create { name, team, stack, template } => {
            let project = client
                .post(
                    "/api/v1/project",
                    json!({ "name": name, "team": team, "stack": stack, "template": template, "options": {} }),
                )
                .await?;
            output_value(&output_format, &project)
        }
        ProjectCommands::Get { id } => {
            output_value(&output_format, &client.get(&format!("/api/v1/project/{}", id)).await?)
        }
        ProjectCommands::Update { id, name, settings } => {
            let mut body = json!({});
            if let Some(name) = name {
                body["name"] = json!(name);
            }
            if !settings.is_empty() {
                body["settings"] = settings_from_assignments(&settings)?;
            }
            let project = client.put(&format!("/api/v1/project/{}", id), body).await?;
            output_value(&output_format, &project)
        }
        ProjectCommands::Delete { id } => {
            client.delete(&format!("/api/v1/project/{}", id)).await?;
            output_success(&output_format, &format!("Project {} deleted", id), None)
        }
        ProjectCommands::Settings { id } => {
            output_value(&output_format, &client.get(&format!("/api/v1/project/{}/settings", id)).await?)
        }
        ProjectCommands::Logs { id, cursor, limit } => {
            let path = format!("/api/v1/project/{}/logs{}", id, page_query(cursor, limit));
            let page = client.get(&path).await?;
            match output_format {
                OutputFormat::Json => output_value(&output_format, &page),
                OutputFormat::Text => {
                    for entry in page["log"].as_array().into_iter().flatten() {
                        println!(
                            "{} [{}] {}",
                            entry["ts"].as_str().unwrap_or("-"),
                            entry["level"].as_str().unwrap_or("-"),
                            entry["msg"].as_str().unwrap_or("")
                        );
                    }
                    if let Some(previous) = page["meta"]["previous_cursor"].as_str() {
                        println!("previous: --cursor={}", previous);
                    }
                    Ok(())
                }
            }
        }
        ProjectCommands::Audit { id, cursor, limit } => {
            let path = format!("/api/v1/project/{}/audit-log{}", id, page_query(cursor, limit));
            output_value(&output_format, &client.get(&path).await?)
        }
        ProjectCommands::Action { id, action } => {
            client
                .post(&format!("/api/v1/project/{}/actions/{}", id, action.as_str()), json!({}))
                .await?;
            output_success(&output_format, &format!("Project {} {}", id, action.as_str()), None)
        }
    }
}
