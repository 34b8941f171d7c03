//! Configuration management for the element locator.
//!
//! Loads configuration from a TOML file and provides runtime defaults.

use crate::descriptor::DescriptorKind;
use crate::detector::{AccessibleDetector, DEFAULT_MAX_DEPTH};
use crate::store::{LocatorStore, LOCATOR_EXTENSION};
use crate::types::{LocatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "element-locator";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding locator files; defaults to the user data directory
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Locator file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Host application family (generic, wechat, browser)
    #[serde(default)]
    pub descriptor: DescriptorKind,

    /// How many levels below the root the detector may descend
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            descriptor: DescriptorKind::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}

fn default_extension() -> String {
    LOCATOR_EXTENSION.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path, falling back to defaults
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Load configuration from a path the caller insists on.
    ///
    /// Unlike [`load_from_path`](Self::load_from_path), a missing or invalid
    /// file is an error.
    pub fn load_strict(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| LocatorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Default directory for locator files
    pub fn default_storage_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("locators")
    }

    /// Configured storage root, or the default one
    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(Self::default_storage_root)
    }

    /// Build a store rooted at the configured directory. Nothing is loaded.
    pub fn open_store(&self) -> LocatorStore {
        LocatorStore::new(self.storage_root()).with_extension(self.storage.extension.clone())
    }

    /// Build a detector for the configured application family
    pub fn detector(&self) -> AccessibleDetector {
        AccessibleDetector::from_kind(self.detector.descriptor)
            .with_max_depth(self.detector.max_depth)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| LocatorError::Config(e.to_string()))?;

        std::fs::write(path, contents)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
