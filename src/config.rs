//! Configuration loading.
//!
//! Configuration is loaded from a TOML file with the following resolution
//! order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.colloquy/config.toml` (user; optional)
//! 3. built-in defaults
//!
//! API keys are not part of this file: they live in the key-value store
//! (written by `colloquy config set`) with `ANTHROPIC_API_KEY` /
//! `OPENAI_API_KEY` as fallbacks.
//!
//! ```toml
//! default_model = "claude-3-haiku-20240307"
//!
//! [storage]
//! path = "/home/me/.local/share/colloquy/storage.json"
//!
//! [providers]
//! timeout_secs = 60
//!
//! [providers.openai]
//! base_url = "http://localhost:8080/v1/"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::providers::DEFAULT_TIMEOUT_SECS;
use crate::store::FileStore;
use crate::types::ProviderKind;
use crate::{ColloquyError, Result};

/// Model used when the store has no `selectedModel`.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Model used until one is selected and saved.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            storage: StorageConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Where the key-value store lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Store file (default: `<data dir>/colloquy/storage.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, or the platform default.
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(FileStore::default_path)
    }
}

/// Provider client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Request timeout in seconds (default: 120).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub anthropic: Option<EndpointConfig>,
    #[serde(default)]
    pub openai: Option<EndpointConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            anthropic: None,
            openai: None,
        }
    }
}

impl ProvidersConfig {
    /// Endpoint override for a provider family, if configured.
    pub fn base_url(&self, kind: ProviderKind) -> Option<&str> {
        let endpoint = match kind {
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::OpenAi => self.openai.as_ref(),
        };
        endpoint.and_then(|e| e.base_url.as_deref())
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Per-provider endpoint settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the user config is used if
    /// present, otherwise defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(ColloquyError::Configuration(format!(
                    "Config file not found: {path:?}"
                )));
            }
            return Self::load_from_file(path);
        }

        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.colloquy/config.toml`, if a home directory is known.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".colloquy").join("config.toml"))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ColloquyError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            ColloquyError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }
}
