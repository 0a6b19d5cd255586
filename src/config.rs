//! Configuration management for plandoc.
//!
//! Handles loading configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::plan::{Reviewers, DEFAULT_BRANCH_PATTERN};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Reviewer set given to new plans
    pub reviewers: Reviewers,

    /// Branch naming
    pub branches: BranchConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding plan documents (`~` and `$VAR` are expanded)
    pub plans_dir: String,

    /// Author recorded on new plans when none is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Branch naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Pattern with `{plan}`, `{phase}` and `{issue}` placeholders
    pub pattern: String,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.plandoc.toml` in current directory
    /// 2. `~/.config/plandoc/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".plandoc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(global_config) = Self::global_config_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Path of the file [`load`](Self::load) would read, if any exists.
    pub fn active_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(".plandoc.toml");
        if local_config.exists() {
            return Some(local_config);
        }
        Self::global_config_path().filter(|p| p.exists())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("plandoc"))
    }

    fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Plans directory with `~` and environment variables expanded.
    pub fn plans_dir(&self) -> PathBuf {
        let raw = self.general.plans_dir.as_str();
        let expanded = shellexpand::full(raw).unwrap_or_else(|_| raw.into());
        PathBuf::from(expanded.as_ref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            reviewers: Reviewers::standard(),
            branches: BranchConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { plans_dir: "plans".to_string(), author: None }
    }
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self { pattern: DEFAULT_BRANCH_PATTERN.to_string() }
    }
}
