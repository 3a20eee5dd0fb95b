pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "ffctl")]
#[command(about = "FlowForge CLI - manage projects, templates and tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Select and check the FlowForge server")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Issue and store API tokens")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Remote project operations")]
    Project {
        #[command(subcommand)]
        cmd: commands::project::ProjectCommands,
    },

    #[command(about = "Inspect and edit template files locally")]
    Template {
        #[command(subcommand)]
        cmd: commands::template::TemplateCommands,
    },

    #[command(about = "Seed a database with an admin, a team, a stack and a template")]
    Seed(commands::seed::SeedArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Project { cmd } => commands::project::handle(cmd, output_format).await,
        Commands::Template { cmd } => commands::template::handle(cmd, output_format).await,
        Commands::Seed(args) => commands::seed::handle(args, output_format).await,
    }
}
