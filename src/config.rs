use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat/analytics backend
    pub base_url: String,

    /// Send the interstitial-bypass header (needed when the backend is
    /// exposed through an ngrok-style tunnel)
    #[serde(default)]
    pub bypass_interstitial: bool,

    /// Trendchat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            bypass_interstitial: false,
            home: home.join(".trendchat"),
        }
    }
}

impl Config {
    /// Load configuration from ~/.trendchat/config.toml, creating the home
    /// directory on first run. TRENDCHAT_BASE_URL overrides the file.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".trendchat");
        fs::create_dir_all(&home).context("Failed to create .trendchat directory")?;

        let config_path = home.join("config.toml");
        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.home = home;
        if let Ok(url) = std::env::var("TRENDCHAT_BASE_URL") {
            config.base_url = url;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Path of the chat history file
    pub fn history_path(&self) -> PathBuf {
        self.home.join("history.json")
    }
}
