use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims, TokenScope};
use crate::cli::config::{load_cli_config, save_cli_config};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token with the local JWT_SECRET")]
    Issue {
        #[arg(help = "User id, or project id with --project")]
        subject: Uuid,
        #[arg(long, help = "Issue a project runtime token instead of a user token")]
        project: bool,
        #[arg(long, help = "Expiry in hours (defaults to the configured expiry)")]
        hours: Option<u64>,
        #[arg(long, help = "Store the token for later commands")]
        save: bool,
    },

    #[command(about = "Store an existing token for later commands")]
    Set {
        #[arg(help = "Bearer token")]
        token: String,
    },

    #[command(about = "Forget the stored token")]
    Clear,
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_cli_config()?;

    match cmd {
        TokenCommands::Issue { subject, project, hours, save } => {
            let security = AppConfig::from_env().security;
            let scope = if project { TokenScope::Project } else { TokenScope::User };
            let claims = Claims::new(subject, scope, hours.unwrap_or(security.jwt_expiry_hours));
            let token = generate_jwt(&claims, &security)?;

            if save {
                config.set_token(token.clone());
                save_cli_config(&config)?;
            }
            output_value(
                &output_format,
                &json!({ "token": token, "scope": scope, "expires_at": claims.exp, "saved": save }),
            )
        }
        TokenCommands::Set { token } => {
            config.set_token(token);
            save_cli_config(&config)?;
            output_success(&output_format, "Token saved", None)
        }
        TokenCommands::Clear => {
            config.token = None;
            config.token_saved_at = None;
            save_cli_config(&config)?;
            output_success(&output_format, "Token cleared", None)
        }
    }
}
