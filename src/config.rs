use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::registry::JsonRegistry;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding `models.json`, `behavior_templates.json` and
    /// `default_dialog_config.json`.
    pub config_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// Reply cap for providers that require one (Anthropic).
    pub max_tokens: u32,
    pub connect_timeout_secs: u64,
    /// Whole-request limit, streaming included.
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let config_dir = default_fbac_dir()
            .join("configs")
            .to_string_lossy()
            .into_owned();
        Self { config_dir }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            connect_timeout_secs: 30,
            request_timeout_secs: 600,
        }
    }
}

/// Returns `~/.fbac/`
pub fn default_fbac_dir() -> PathBuf {
    home_dir().join(".fbac")
}

/// Returns the default config file path: `~/.fbac/config.toml`
pub fn default_config_path() -> PathBuf {
    default_fbac_dir().join("config.toml")
}

impl AppConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (FBAC_CONFIG_DIR, FBAC_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FBAC_CONFIG_DIR") {
            self.registry.config_dir = val;
        }
        if let Ok(val) = std::env::var("FBAC_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the registry directory, expanding `~` if needed.
    pub fn resolved_config_dir(&self) -> PathBuf {
        expand_tilde(&self.registry.config_dir)
    }

    /// The file-backed registry over [`resolved_config_dir`](Self::resolved_config_dir).
    pub fn registry(&self) -> JsonRegistry {
        JsonRegistry::from_dir(self.resolved_config_dir())
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
