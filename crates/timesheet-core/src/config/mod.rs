//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::storage::database::DEFAULT_MAX_CONNECTIONS;

/// Environment variable that overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "TIMESHEET_CONFIG_DIR";

const DATABASE_FILE: &str = "timesheet.db";

/// Timesheet configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; `None` means `<config_dir>/timesheet.db`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "timesheet=info".to_string(),
        }
    }
}

const KEYS: [&str; 3] = ["database.path", "database.max_connections", "logging.filter"];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("timesheet")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(anyhow!("logging.filter must not be empty"));
        }
        Ok(())
    }

    /// Database file in effect: the configured path, or the default beside the config
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join(DATABASE_FILE)),
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database_path()?.display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "logging.filter" => Ok(self.logging.filter.clone()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    ///
    /// An empty `database.path` restores the default location.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                let value = value.trim();
                self.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("database.max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }
            "logging.filter" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("logging.filter must not be empty"));
                }
                self.logging.filter = value.to_string();
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `timesheet config list` to see available keys.",
        key
    )
}
