//! Feature-specific logging macros and utilities
//!
//! Each engine component logs under its own target so that operators can raise
//! or lower verbosity per feature (see `LoggingConfig::features`).

/// Feature categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFeature {
    Property,
    Dataset,
    Merge,
    Lock,
    Storage,
}

impl LogFeature {
    pub const ALL: [LogFeature; 5] = [
        LogFeature::Property,
        LogFeature::Dataset,
        LogFeature::Merge,
        LogFeature::Lock,
        LogFeature::Storage,
    ];

    /// Get the target string for this feature
    pub fn target(&self) -> &'static str {
        match self {
            LogFeature::Property => "scene_property::property",
            LogFeature::Dataset => "scene_property::dataset",
            LogFeature::Merge => "scene_property::merge",
            LogFeature::Lock => "scene_property::lock",
            LogFeature::Storage => "scene_property::storage",
        }
    }

    /// Short name used as key in the logging configuration
    pub fn name(&self) -> &'static str {
        match self {
            LogFeature::Property => "property",
            LogFeature::Dataset => "dataset",
            LogFeature::Merge => "merge",
            LogFeature::Lock => "lock",
            LogFeature::Storage => "storage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

// Property store logging macros
#[macro_export]
macro_rules! log_property_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "scene_property::property", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_property_info {
    ($($arg:tt)*) => {
        log::info!(target: "scene_property::property", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_property_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "scene_property::property", $($arg)*)
    };
}

// Dataset graph logging macros
#[macro_export]
macro_rules! log_dataset_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "scene_property::dataset", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_dataset_info {
    ($($arg:tt)*) => {
        log::info!(target: "scene_property::dataset", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_dataset_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "scene_property::dataset", $($arg)*)
    };
}

// Merge engine logging macros
#[macro_export]
macro_rules! log_merge_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "scene_property::merge", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_merge_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "scene_property::merge", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_merge_trace {
    ($($arg:tt)*) => {
        log::trace!(target: "scene_property::merge", $($arg)*)
    };
}

// Scene lock logging macros
#[macro_export]
macro_rules! log_lock_info {
    ($($arg:tt)*) => {
        log::info!(target: "scene_property::lock", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_lock_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "scene_property::lock", $($arg)*)
    };
}

// Storage logging macros
#[macro_export]
macro_rules! log_storage_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "scene_property::storage", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_storage_error {
    ($($arg:tt)*) => {
        log::error!(target: "scene_property::storage", $($arg)*)
    };
}

/// Logs the duration of an operation when finished.
pub struct PerformanceTimer {
    start: std::time::Instant,
    feature: LogFeature,
    operation: String,
}

impl PerformanceTimer {
    pub fn new(feature: LogFeature, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        log::trace!(target: feature.target(), "Starting timed operation: {}", operation);
        Self {
            start: std::time::Instant::now(),
            feature,
            operation,
        }
    }

    pub fn finish(self) {
        log::debug!(
            target: self.feature.target(),
            "Operation '{}' completed in {:?}",
            self.operation,
            self.start.elapsed()
        );
    }
}
