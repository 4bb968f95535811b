//! Configuration loading and runtime paths.
//!
//! Everything lives under `~/.telerelay/`:
//! - `config.toml`: bot settings and admin list
//! - `.env`: the bot token
//! - `relay.db`: channels, edges and filter rules
//! - `logs/`: rotated JSON logs

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Telegram bot settings.
    pub telegram: TelegramConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Telegram-specific configuration.
#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    /// Environment variable name holding the bot token.
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Telegram user IDs allowed to run relay commands.
    pub admin_users: Vec<i64>,
}

/// Where the relay database lives.
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database path; defaults to `~/.telerelay/relay.db`.
    pub path: Option<PathBuf>,
}

fn default_bot_token_env() -> String {
    "TELERELAY_BOT_TOKEN".to_owned()
}

impl Config {
    /// The database path to open.
    pub fn database_path(&self, paths: &RuntimePaths) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| paths.database.clone())
    }
}

/// Resolved runtime file locations.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// `~/.telerelay`
    pub root: PathBuf,
    /// `~/.telerelay/config.toml`
    pub config_toml: PathBuf,
    /// `~/.telerelay/.env`
    pub env_file: PathBuf,
    /// `~/.telerelay/relay.db`
    pub database: PathBuf,
    /// `~/.telerelay/logs`
    pub logs_dir: PathBuf,
}

impl RuntimePaths {
    /// Paths rooted at `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config_toml: root.join("config.toml"),
            env_file: root.join(".env"),
            database: root.join("relay.db"),
            logs_dir: root.join("logs"),
        }
    }
}

/// Load the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
}

/// Parse config TOML.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or required keys are missing.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(contents)?)
}

/// Resolve the default config directory (`~/.telerelay/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".telerelay"))
}

/// Resolve runtime paths under the default config directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn runtime_paths() -> anyhow::Result<RuntimePaths> {
    Ok(RuntimePaths::under(&config_dir()?))
}
