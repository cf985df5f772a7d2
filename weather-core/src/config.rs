use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{history::DEFAULT_BACKEND_URL, provider::weatherapi::WEATHERAPI_BASE_URL};

pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const BACKEND_URL_ENV: &str = "WEATHER_BACKEND_URL";

/// Upstream weather API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: WEATHERAPI_BASE_URL.to_string() }
    }
}

/// History backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BACKEND_URL.to_string() }
    }
}

/// Tunables of the search box and the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub max_suggestions: usize,
    pub forecast_days: usize,
    pub range_horizon_days: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_len: 2,
            max_suggestions: 5,
            forecast_days: 5,
            range_horizon_days: 3,
        }
    }
}

/// Settings consumed by the suggestion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub max_suggestions: usize,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        SearchConfig::default().suggestion_settings()
    }
}

/// Settings consumed by the search orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub forecast_days: usize,
    pub range_horizon_days: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchConfig::default().search_settings()
    }
}

impl SearchConfig {
    pub fn suggestion_settings(&self) -> SuggestionSettings {
        SuggestionSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            min_query_len: self.min_query_len,
            max_suggestions: self.max_suggestions,
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            forecast_days: self.forecast_days,
            range_horizon_days: self.range_horizon_days,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
///
/// [backend]
/// base_url = "http://localhost:8000/api"
///
/// [search]
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub backend: BackendConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-search", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Environment wins over the file. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url;
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    /// API key for the weather provider, or a hint on how to configure one.
    pub fn api_key(&self) -> Result<&str> {
        self.provider.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weather configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }
}
