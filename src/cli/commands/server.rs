use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_cli_config, save_cli_config};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server")]
    Use {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the selected server")]
    Current,

    #[command(about = "Show server information from the API root endpoint")]
    Info,

    #[command(about = "Check server health from the /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_cli_config()?;

    match cmd {
        ServerCommands::Use { url } => {
            let url = url::Url::parse(&url)?;
            config.server_url = Some(url.as_str().trim_end_matches('/').to_string());
            save_cli_config(&config)?;
            output_success(
                &output_format,
                &format!("Using server {}", config.server_url()),
                Some(json!({ "server_url": config.server_url() })),
            )
        }
        ServerCommands::Current => output_value(
            &output_format,
            &json!({ "server_url": config.server_url(), "token": config.token.is_some() }),
        ),
        ServerCommands::Info => {
            let client = ApiClient::from_config(&config)?;
            output_value(&output_format, &client.get("/").await?)
        }
        ServerCommands::Health => {
            let client = ApiClient::from_config(&config)?;
            output_value(&output_format, &client.get("/health").await?)
        }
    }
}
