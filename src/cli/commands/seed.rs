use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::{NewStack, NewTeam, NewTemplate, NewUser};
use crate::database::{DatabaseManager, PgStore, Store};
use crate::permissions::Role;

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, help = "Database URL (defaults to DATABASE_URL)")]
    pub database_url: Option<String>,
    #[arg(long, default_value = "admin", help = "Admin username")]
    pub username: String,
    #[arg(long, default_value = "admin@example.com", help = "Admin email")]
    pub email: String,
    #[arg(long, default_value = "Default Team", help = "Team name")]
    pub team: String,
    #[arg(long, default_value = "node-red-2", help = "Stack name")]
    pub stack: String,
    #[arg(long, default_value = "Default Template", help = "Template name")]
    pub template: String,
}

/// Lowercase, hyphen separated form of a team name
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub async fn handle(args: SeedArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    let database = DatabaseManager::connect(&config.database).await?;
    let store = PgStore::new(database.pool().clone());

    let user = store
        .create_user(NewUser {
            username: args.username.clone(),
            name: args.username,
            email: args.email,
            admin: true,
        })
        .await?;
    let team = store
        .create_team(NewTeam {
            slug: slugify(&args.team),
            name: args.team,
        })
        .await?;
    store.add_team_member(team.id, user.id, Role::Owner).await?;

    let stack = store
        .create_stack(NewStack {
            name: args.stack,
            active: true,
            properties: json!({ "nodered": "2.2.2" }),
        })
        .await?;
    let template = store
        .create_template(NewTemplate {
            name: args.template,
            description: "Created by ffctl seed".to_string(),
            active: true,
            settings: json!({}),
            policy: json!({ "httpAdminRoot": true, "disableEditor": true }),
            owner_id: Some(user.id),
        })
        .await?;

    let token = generate_jwt(&Claims::for_user(user.id, &config.security), &config.security)?;
    tracing::info!("Seeded admin {} in team {}", user.username, team.name);
    database.close().await;

    output_value(
        &output_format,
        &json!({
            "user": user.id,
            "team": team.id,
            "stack": stack.id,
            "template": template.id,
            "token": token,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugs_are_lowercase_and_hyphenated() {
        assert_eq!(slugify("Default Team"), "default-team");
        assert_eq!(slugify("  ACME / R&D "), "acme-r-d");
    }
}
