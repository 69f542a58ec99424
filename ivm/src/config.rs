//! Configuration management for ivm.
//!
//! The database location is resolved with precedence:
//! 1. `--database` flag / `IVM_DATABASE_PATH` env var
//! 2. Config file (`IVM_CONFIG`, or `<config dir>/ivm/config.toml`)
//! 3. Default `instance/interview.db` relative to the current directory

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("instance").join("interview.db")
}

fn default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "interview-platform", "ivm") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ivm")
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("IVM_CONFIG") {
            PathBuf::from(path)
        } else {
            default_config_dir().join("config.toml")
        }
    }

    /// Apply a command-line override of the database path.
    pub fn with_database_override(mut self, database: Option<PathBuf>) -> Self {
        if let Some(path) = database {
            self.database.path = path;
        }
        self
    }
}
