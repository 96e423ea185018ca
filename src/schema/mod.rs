//! Schema store: the immutable description of allowed groups and fields.

pub mod property_schema;
pub mod registry;
pub mod validator;

pub use property_schema::{PropertySchema, SchemaField, SchemaGroup};
pub use registry::SchemaStore;
pub use validator::validate_schema;
