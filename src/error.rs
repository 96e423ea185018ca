//! # Error Handling
//!
//! Unified error type for the property engine. Shape and type violations,
//! lock conflicts and storage failures are surfaced through [`PropertyError`];
//! dangling dataset links are never errors and resolve to an absent value instead.

use std::io;
use thiserror::Error;

/// Unified error type for the entire crate.
#[derive(Error, Debug)]
pub enum PropertyError {
    // ========== Lookup Errors ==========
    /// A property, schema, dataset or list item with the given id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // ========== Shape and Type Errors ==========
    /// A value does not match the declared type of its field
    #[error("Invalid value type for field {field}: expected {expected}, found {actual}")]
    InvalidValueType {
        field: String,
        expected: String,
        actual: String,
    },

    /// A traversal depth outside of the supported range was requested
    #[error("Invalid traversal depth {depth}: must be within [0, {max}]")]
    InvalidDepth { depth: i64, max: usize },

    /// A link chain does not follow the reference edges of the dataset schema graph
    #[error("Invalid link chain: {reason}")]
    InvalidLinkChain { reason: String },

    /// A locator does not address the kind of item the operation requires
    #[error("Invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// Property and schema ids disagree
    #[error("Schema mismatch: expected {expected}, found {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// A registered schema cannot be replaced by a different definition
    #[error("Schema {id} is immutable once registered")]
    SchemaImmutable { id: String },

    /// A schema definition failed validation
    #[error("Invalid schema {id}: {reason}")]
    InvalidSchema { id: String, reason: String },

    // ========== Concurrency Errors ==========
    /// The scene is held by a long-running operation
    #[error("Scene {scene} is locked ({state})")]
    SceneLocked { scene: String, state: String },

    /// The caller cancelled the operation
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    // ========== Infrastructure Errors ==========
    /// Storage backend failure
    #[error("Database operation failed: {operation} - {reason}")]
    Database { operation: String, reason: String },

    /// Transaction misuse or rollback failure
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization or deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration loading or validation failure
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PropertyError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_value_type(
        field: impl ToString,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::InvalidValueType {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn invalid_link_chain(reason: impl Into<String>) -> Self {
        Self::InvalidLinkChain {
            reason: reason.into(),
        }
    }

    pub fn invalid_locator(locator: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_schema(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn database(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Database {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Returns true for errors caused by the addressed record being absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Conversion from sled::Error to PropertyError
impl From<sled::Error> for PropertyError {
    fn from(error: sled::Error) -> Self {
        PropertyError::database("sled", error)
    }
}

/// Conversion from serde_json::Error to PropertyError
impl From<serde_json::Error> for PropertyError {
    fn from(error: serde_json::Error) -> Self {
        PropertyError::Serialization(error.to_string())
    }
}

/// Conversion from toml::de::Error to PropertyError
impl From<toml::de::Error> for PropertyError {
    fn from(error: toml::de::Error) -> Self {
        PropertyError::Config(error.to_string())
    }
}

/// Result type alias for operations that can result in a PropertyError
pub type PropertyResult<T> = Result<T, PropertyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PropertyError::not_found("property", "p1");
        assert_eq!(err.to_string(), "property not found: p1");
        assert!(err.is_not_found());

        let err = PropertyError::InvalidDepth { depth: 4, max: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid traversal depth 4: must be within [0, 3]"
        );
    }

    #[test]
    fn test_conversions() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: PropertyError = json_err.into();
        assert!(matches!(err, PropertyError::Serialization(_)));

        let io_err = io::Error::new(io::ErrorKind::Other, "disk");
        let err: PropertyError = io_err.into();
        assert!(matches!(err, PropertyError::Io(_)));
    }
}
