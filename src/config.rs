//! Global CLI configuration
//!
//! Stores the backend URL and request timeout in ~/.studioboard/config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use studioboard_client::{ClientConfig, DEFAULT_API_URL};

/// Persisted CLI settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioboardConfig {
    /// Backend base URL, e.g. `https://studio.example.com/api`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StudioboardConfig {
    /// Client configuration, letting `override_url` (flag or environment) win
    pub fn client_config(&self, override_url: Option<&str>) -> Result<ClientConfig> {
        let base_url = override_url
            .or(self.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL);

        let mut builder = ClientConfig::builder().base_url(base_url);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder
            .build()
            .map_err(anyhow::Error::msg)
            .context("Invalid client configuration")
    }
}

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".studioboard").join("config.json"))
    }

    pub fn load() -> Result<StudioboardConfig> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(config: &StudioboardConfig) -> Result<()> {
        Self::save_to(&Self::config_path()?, config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<StudioboardConfig> {
        if !path.exists() {
            return Ok(StudioboardConfig::default());
        }

        let json =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&json).context(format!("Failed to parse config file: {:?}", path))
    }

    pub fn save_to(path: &Path, config: &StudioboardConfig) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(path, json).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Set the default backend URL
    pub fn set_api_url(url: String) -> Result<()> {
        // Validate before persisting
        StudioboardConfig {
            api_url: Some(url.clone()),
            timeout_secs: None,
        }
        .client_config(None)?;

        let mut config = Self::load()?;
        config.api_url = Some(url);
        Self::save(&config)
    }

    pub fn clear_api_url() -> Result<()> {
        let mut config = Self::load()?;
        config.api_url = None;
        Self::save(&config)
    }

    pub fn set_timeout(secs: u64) -> Result<()> {
        let mut config = Self::load()?;
        config.timeout_secs = Some(secs);
        Self::save(&config)
    }
}
