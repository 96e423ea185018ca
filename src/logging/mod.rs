//! # Logging System
//!
//! Thin layer over the `log` facade. Components log through the feature macros in
//! [`features`]; the binary embedding the engine calls [`LoggingSystem::init`] once
//! to install an `env_logger` backend filtered per feature.

pub mod features;

pub use features::{LogFeature, PerformanceTimer};

use crate::config::{parse_level, LoggingConfig};
use crate::error::{PropertyError, PropertyResult};
use once_cell::sync::OnceCell;
use std::io::Write;

/// Configuration the logger was installed with
static LOGGING_CONFIG: OnceCell<LoggingConfig> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Install the global logger. Fails if a logger was already installed.
    pub fn init(config: &LoggingConfig) -> PropertyResult<()> {
        let default_level = parse_level(&config.level)?;
        let mut builder = env_logger::Builder::new();
        builder.filter_level(default_level);

        for (name, level) in &config.features {
            let feature = LogFeature::from_name(name).ok_or_else(|| {
                PropertyError::Config(format!("unknown logging feature: {}", name))
            })?;
            builder.filter_module(feature.target(), parse_level(level)?);
        }

        if !config.include_timestamp {
            builder.format(|buf, record| {
                writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
            });
        }

        builder
            .try_init()
            .map_err(|e| PropertyError::Config(format!("failed to install logger: {}", e)))?;

        LOGGING_CONFIG
            .set(config.clone())
            .map_err(|_| PropertyError::Config("logging already initialized".to_string()))
    }

    /// Install the logger with default settings
    pub fn init_default() -> PropertyResult<()> {
        Self::init(&LoggingConfig::default())
    }

    /// The configuration passed to a successful [`init`](Self::init)
    pub fn config() -> Option<&'static LoggingConfig> {
        LOGGING_CONFIG.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_round_trip() {
        for feature in LogFeature::ALL {
            assert_eq!(LogFeature::from_name(feature.name()), Some(feature));
            assert!(feature.target().starts_with("scene_property::"));
        }
        assert_eq!(LogFeature::from_name("network"), None);
    }

    #[test]
    fn test_unknown_feature_rejected_before_install() {
        let mut config = LoggingConfig::default();
        config.features.insert("network".to_string(), "debug".to_string());
        assert!(matches!(
            LoggingSystem::init(&config),
            Err(PropertyError::Config(_))
        ));
    }

    #[test]
    fn test_config_unset_when_another_logger_is_installed() {
        let _ = env_logger::builder().is_test(true).try_init();
        assert!(matches!(
            LoggingSystem::init_default(),
            Err(PropertyError::Config(_))
        ));
        assert!(LoggingSystem::config().is_none());
    }
}
