//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[serde(default)]` uses `Default::default()` for missing fields, so a
//! config file only needs the keys it wants to change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use zonekit_model::Domain;

use crate::catalog::AreaFilter;
use crate::service::DEFAULT_DOMAINS;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local store settings
    pub store: StoreConfig,

    /// Entity catalog settings
    pub catalog: CatalogConfig,

    /// Draft editing settings
    pub editor: EditorConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("zonekit").join("config.toml"))
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Local store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON store file
    pub path: PathBuf,
}

impl StoreConfig {
    /// Returns the default store path under the user data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zonekit")
            .join("zones.json")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

/// Entity catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Domains requested from the service
    pub domains: Vec<Domain>,

    /// Area applied on startup (empty = all areas)
    pub default_area: String,
}

impl CatalogConfig {
    /// Returns the startup area filter.
    pub fn default_filter(&self) -> AreaFilter {
        AreaFilter::from_id(&self.default_area)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            domains: DEFAULT_DOMAINS.to_vec(),
            default_area: String::new(),
        }
    }
}

/// Draft editing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum lights in a zone's own light group (0 = unlimited)
    pub light_group_limit: usize,

    /// Warn before a save truncates overlong pair lists
    pub warn_on_truncate: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            light_group_limit: 1,
            warn_on_truncate: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
