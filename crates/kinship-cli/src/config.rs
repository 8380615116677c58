//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use kinship_core::limits::{validate_query_limit, DEFAULT_QUERY_LIMIT};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "KINSHIP_CONFIG";

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kinship")
}

/// Location of `config.toml`
pub fn config_file_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kinship")
            .join("config.toml"),
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Redb,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown backend '{}' (expected sqlite, redb or memory)", other),
        }
    }
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    /// Prepended to SQLite table names
    pub table_prefix: String,
    /// Requesting identity for relationship queries
    pub identity: i64,
    /// Access ids the requesting identity may see
    pub visibility: Vec<i64>,
    pub default_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: BackendKind::default(),
            table_prefix: String::new(),
            identity: 0,
            visibility: Vec::new(),
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "data_dir",
            "backend",
            "table_prefix",
            "identity",
            "visibility",
            "default_limit",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "data_dir" => self.data_dir.display().to_string(),
            "backend" => self.backend.as_str().to_string(),
            "table_prefix" => self.table_prefix.clone(),
            "identity" => self.identity.to_string(),
            "visibility" => self
                .visibility
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(","),
            "default_limit" => self.default_limit.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "backend" => self.backend = value.parse()?,
            "table_prefix" => self.table_prefix = value.to_string(),
            "identity" => {
                self.identity = value
                    .parse()
                    .with_context(|| format!("identity must be an integer, got '{}'", value))?
            }
            "visibility" => {
                self.visibility = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<i64>())
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("visibility must be a comma-separated list of integers, got '{}'", value))?
            }
            "default_limit" => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("default_limit must be a positive integer, got '{}'", value))?;
                validate_query_limit(limit)?;
                self.default_limit = limit;
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }
}
