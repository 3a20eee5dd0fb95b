use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Persistent CLI state, stored as `cli.json` in the config directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub token_saved_at: Option<DateTime<Utc>>,
}

impl CliConfig {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
        self.token_saved_at = Some(Utc::now());
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("FLOWFORGE_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("flowforge").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_cli_config() -> anyhow::Result<CliConfig> {
    let config_file = get_config_dir()?.join("cli.json");

    if !config_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(config_file)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_cli_config(config: &CliConfig) -> anyhow::Result<()> {
    let config_file = get_config_dir()?.join("cli.json");
    fs::write(config_file, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
