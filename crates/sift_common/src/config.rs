//! Sift Configuration System
//!
//! Config file: ~/.config/sift/config.toml or /etc/sift/config.toml

use crate::knowledge::retriever::DEFAULT_TOP_K;
use crate::llm_client::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment overrides
pub const ENV_LLM_ENDPOINT: &str = "SIFT_LLM_ENDPOINT";
pub const ENV_LLM_MODEL: &str = "SIFT_LLM_MODEL";
pub const ENV_DB_PATH: &str = "SIFT_DB_PATH";

/// Relational store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sift")
        .join("store.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Retrieval settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Corpus file (blank-line-separated passages). Built-in passages when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            corpus_path: None,
        }
    }
}

/// Main Sift configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiftConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl SiftConfig {
    /// Default user config path: ~/.config/sift/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(config_dir.join("sift").join("config.toml"))
    }

    /// System config path: /etc/sift/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/sift/config.toml")
    }

    /// Load a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SiftConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration, then apply environment overrides
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/sift/config.toml)
    /// 3. System config (/etc/sift/config.toml)
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::load_default_locations()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_default_locations() -> Result<Self> {
        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Apply overrides from a variable lookup (the environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_LLM_ENDPOINT).filter(|v| !v.is_empty()) {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL).filter(|v| !v.is_empty()) {
            self.llm.model = model;
        }
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.database.path = PathBuf::from(path);
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Write configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string = self.to_toml_string()?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
