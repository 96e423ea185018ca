//! Configuration module for the property engine
//!
//! Configuration is read from TOML. Every section has defaults so a partial
//! (or empty) file is valid, and a couple of environment variables override
//! the file for deployment convenience.

use crate::constants::{DEFAULT_DATA_DIR_NAME, DEFAULT_MAX_DEPTH, ENV_DB_PATH, ENV_LOG_LEVEL, MAX_DEPTH};
use crate::error::{PropertyError, PropertyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Storage backend settings
    pub storage: StorageConfig,
    /// Dataset traversal settings
    pub traversal: TraversalConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory; defaults to the platform data dir
    pub path: Option<PathBuf>,
    /// Open a throwaway database that is deleted on drop
    pub temporary: bool,
    /// Flush sled after every write
    pub flush_on_write: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            temporary: false,
            flush_on_write: true,
        }
    }
}

/// Traversal configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Default depth for dataset graph walks
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    pub level: String,
    /// Include timestamps in log lines
    pub include_timestamp: bool,
    /// Feature-specific log levels keyed by feature name (e.g. "merge")
    pub features: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_timestamp: true,
            features: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> PropertyResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file and apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> PropertyResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCENE_PROPERTY_DB_PATH` and `SCENE_PROPERTY_LOG_LEVEL` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            if !path.is_empty() {
                self.storage.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    pub fn validate(&self) -> PropertyResult<()> {
        if self.traversal.max_depth > MAX_DEPTH {
            return Err(PropertyError::Config(format!(
                "traversal.max_depth must be at most {}, got {}",
                MAX_DEPTH, self.traversal.max_depth
            )));
        }
        parse_level(&self.logging.level)?;
        for (feature, level) in &self.logging.features {
            parse_level(level).map_err(|_| {
                PropertyError::Config(format!("invalid level '{}' for feature '{}'", level, feature))
            })?;
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Resolve the database directory.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_DATA_DIR_NAME),
        }
    }

    /// Open the sled database described by this section.
    pub fn open(&self) -> PropertyResult<sled::Db> {
        let db = if self.temporary {
            sled::Config::new().temporary(true).open()?
        } else {
            sled::open(self.resolved_path())?
        };
        Ok(db)
    }
}

pub(crate) fn parse_level(level: &str) -> PropertyResult<log::LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(log::LevelFilter::Trace),
        "debug" => Ok(log::LevelFilter::Debug),
        "info" => Ok(log::LevelFilter::Info),
        "warn" => Ok(log::LevelFilter::Warn),
        "error" => Ok(log::LevelFilter::Error),
        "off" => Ok(log::LevelFilter::Off),
        other => Err(PropertyError::Config(format!("invalid log level: {}", other))),
    }
}
