//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::SessionSettings;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub discord: DiscordConfig,
    pub chat_log: ChatLogConfig,
    pub storage: StorageConfig,
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: char,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscordConfig {
    pub token: Option<String>,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChatLogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub uri: String,
    pub database: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ShutdownConfig {
    pub timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "digo-bot".to_string(),
            prefix: '!',
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for ChatLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("discord_chatting_log.txt"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://mongodb:27017".to_string(),
            database: "hots".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Load `path` if it exists.
    ///
    /// A missing or unparseable file falls back to defaults with a warning;
    /// a file that parses but holds invalid values is an error.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load(path) {
            Err(ConfigError::Parse(e)) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from any variable source
    pub fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var("DISCORD_TOKEN") {
            self.discord.token = Some(token);
        }
        if let Some(uri) = var("MONGODB_URI") {
            self.storage.uri = uri;
        }
        if let Some(database) = var("MONGODB_DATABASE") {
            self.storage.database = database;
        }
        if let Some(path) = var("CHAT_LOG_PATH") {
            self.chat_log.path = PathBuf::from(path);
        }
    }

    /// The token, if one is set and not blank
    pub fn token(&self) -> Option<&str> {
        self.discord
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_whitespace() {
            return Err(ConfigError::InvalidValue("bot.prefix must not be whitespace".to_string()));
        }
        if self.discord.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("discord.connect-timeout-secs must be positive".to_string()));
        }
        if self.storage.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("storage.timeout-secs must be positive".to_string()));
        }
        if self.shutdown.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("shutdown.timeout-secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.discord.connect_timeout_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            storage_uri: self.storage.uri.clone(),
            storage_timeout: Duration::from_secs(self.storage.timeout_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown.timeout_secs),
        }
    }
}
