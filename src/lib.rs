//! # Scene Property Library
//!
//! Property composition and dataset-link resolution for layered map scenes.
//! A layer's configuration (a *property*) is assembled at read time from an
//! item-level override, a template-level parent and values pulled from
//! external tabular records (*datasets*) chained through reference columns.
//!
//! ## Core Components
//!
//! * `schema` - Immutable descriptions of property groups and fields
//! * `dataset` - Dataset schemas, records, link chains and bounded graph walks
//! * `property` - The locator-addressed property tree and its operations
//! * `merge` - Read-only merged views of an original over a parent property
//! * `scene_lock` - Per-scene lock and the permits mutations require
//! * `db_operations` - sled-backed repositories with rollback journal
//! * `managers` - Transactional usecases consuming the engine
//! * `config` / `logging` - Engine configuration and feature-targeted logging

pub mod cancel;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod db_operations;
pub mod error;
pub mod ids;
pub mod logging;
pub mod managers;
pub mod merge;
pub mod property;
pub mod repository;
pub mod scene_lock;
pub mod schema;
pub mod testing_utils;
pub mod value;

// Re-export main types for convenience
pub use cancel::Cancellation;
pub use config::EngineConfig;
pub use dataset::{DatasetGraph, DatasetSource, GraphIterator, Link, LinkChain, SchemaGraphIterator};
pub use db_operations::DbOperations;
pub use error::{PropertyError, PropertyResult};
pub use logging::LoggingSystem;
pub use managers::{DatasetManager, PropertyManager};
pub use merge::{merge, MergedProperty, Merger};
pub use property::{Locator, Property};
pub use scene_lock::{LockState, ScenePermit, SceneLocks};
pub use schema::{PropertySchema, SchemaStore};
pub use value::{Value, ValueType};
