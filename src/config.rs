use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default request timeout; bounds how long a submission may stay pending.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the agent endpoint
    pub api_url: Option<String>,

    /// Access credential passed as the `code` query parameter.
    /// Never logged or shown to the user.
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// UI preferences
    pub ui: UiConfig,

    /// Directory the config was loaded from
    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub thinking_label: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_timestamps: true,
            thinking_label: "Thinking...".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ui: UiConfig::default(),
            config_dir: default_config_dir(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".parley")
}

impl Config {
    /// Load configuration from `~/.parley/config.toml`, falling back to
    /// defaults, with environment variables taking precedence for the
    /// endpoint address and credential.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_dir())
    }

    /// Load configuration from a specific directory.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        let mut config: Config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.config_dir = dir.to_path_buf();

        if let Ok(url) = std::env::var("PARLEY_API_URL") {
            config.api_url = Some(url);
        }
        if let Ok(key) = std::env::var("PARLEY_API_KEY") {
            config.api_key = Some(key);
        }

        Ok(config)
    }

    /// Save configuration to `config.toml` in the config directory.
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)
            .context("Failed to create config directory")?;
        let config_path = self.config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Check that both the endpoint address and credential are present.
    pub fn has_credentials(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }

    /// Endpoint base URL, required for any submission.
    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .context("No agent endpoint configured. Set api_url in config.toml or PARLEY_API_URL.")
    }

    /// Access credential for the endpoint.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("No access key configured. Set api_key in config.toml or PARLEY_API_KEY.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.ui.show_timestamps);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.config_dir = dir.path().to_path_buf();
        config.api_url = Some("https://agent.example.com/api/chat".to_string());
        config.api_key = Some("secret".to_string());
        config.timeout_secs = 10;
        config.save().unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded.api_url.as_deref(), Some("https://agent.example.com/api/chat"));
        assert_eq!(loaded.timeout_secs, 10);
        assert!(loaded.has_credentials());
    }

    #[test]
    fn credentials_are_required_for_accessors() {
        let config = Config {
            config_dir: PathBuf::from("."),
            ..Config::default()
        };
        assert!(!config.has_credentials());
        assert!(config.api_url().is_err());
        assert!(config.api_key().is_err());
    }
}
