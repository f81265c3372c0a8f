use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_CONTENT_CHARS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key (overridden by GEMINI_API_KEY)
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Sampling temperature passed to the model
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Content beyond this many characters is cut before prompting
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Base URL of the Generative Language API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL for a networked database (overridden by DATABASE_URL)
    #[serde(default)]
    pub url: Option<String>,
    /// SQLite file used when no URL is configured (overridden by SQLITE_DB_PATH)
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
    /// Pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: default_sqlite_path(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_content_chars() -> usize {
    MAX_CONTENT_CHARS
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("ai_news_aggregator.db")
}

fn default_max_connections() -> u32 {
    5
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Apply `GEMINI_API_KEY`, `DATABASE_URL` and `SQLITE_DB_PATH` from `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.ai.gemini_api_key = Some(key);
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(path) = get("SQLITE_DB_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> crate::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/aidigest/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("aidigest")
            .join("config.toml")
    }

    /// SQLite fallback path with tilde expansion; relative paths stay relative to the cwd
    pub fn sqlite_path(&self) -> PathBuf {
        expand_tilde(&self.database.sqlite_path)
    }

    /// Gemini API key, or a configuration error naming how to provide one
    pub fn gemini_api_key(&self) -> crate::Result<&str> {
        self.ai
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| {
                crate::Error::Config(
                    "Gemini API key not configured (set GEMINI_API_KEY or ai.gemini_api_key)"
                        .to_string(),
                )
            })
    }
}
