//! Configuration Management
//!
//! Connection settings and polling budgets for mpconf, read from
//! `<config dir>/mpconf/config.json`.

use crate::midpoint::PollSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/midpoint/ws/rest/";
pub const DEFAULT_USERNAME: &str = "administrator";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Midpoint REST root
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Properties file used for `$(key)` substitution
    #[serde(default)]
    pub properties_file: Option<PathBuf>,
    /// Directory for per-file scratch copies
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub polling: PollSettings,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mpconf").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective base URL (CLI > MIDPOINT_URL > config > default)
    pub fn effective_base_url(&self, cli: Option<&str>) -> Result<String> {
        let base_url = pick(cli, "MIDPOINT_URL", &self.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url).with_context(|| format!("Invalid Midpoint URL: {}", base_url))?;
        Ok(base_url)
    }

    /// Get effective username (CLI > MIDPOINT_USERNAME > config > administrator)
    pub fn effective_username(&self, cli: Option<&str>) -> String {
        pick(cli, "MIDPOINT_USERNAME", &self.username)
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    /// Get effective password (CLI > MIDPOINT_PASSWORD > config)
    pub fn effective_password(&self, cli: Option<&str>) -> Result<String> {
        pick(cli, "MIDPOINT_PASSWORD", &self.password).ok_or_else(|| {
            anyhow::anyhow!(
                "No Midpoint password configured. Set MIDPOINT_PASSWORD or use --password"
            )
        })
    }
}

fn pick(cli: Option<&str>, env: &str, configured: &Option<String>) -> Option<String> {
    cli.map(str::to_string)
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
        .or_else(|| configured.clone())
}
