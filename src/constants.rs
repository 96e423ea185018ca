/// Common constants used across the property engine.
///
/// These defaults are used for configuration when explicit values are not provided.
pub const MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_DEPTH: usize = MAX_DEPTH;

/// Names of the sled trees backing each record kind.
pub const PROPERTIES_TREE: &str = "properties";
pub const DATASET_SCHEMAS_TREE: &str = "dataset_schemas";
pub const DATASETS_TREE: &str = "datasets";
pub const SCENE_LOCKS_TREE: &str = "scene_locks";

/// Directory name used under the platform data dir when no path is configured.
pub const DEFAULT_DATA_DIR_NAME: &str = "scene_property";

pub const ENV_DB_PATH: &str = "SCENE_PROPERTY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SCENE_PROPERTY_LOG_LEVEL";
