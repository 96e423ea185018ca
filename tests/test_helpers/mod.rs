#![allow(dead_code)]

pub mod schema_builder;

use scene_property::db_operations::DbOperations;
use scene_property::schema::SchemaStore;
use scene_property::testing_utils::TestDatabaseFactory;
use std::sync::Arc;

/// Temporary store plus a registry holding the marker schema.
pub fn setup_store() -> (Arc<DbOperations>, Arc<SchemaStore>) {
    let (db_ops, schemas) =
        TestDatabaseFactory::create_test_environment().expect("Failed to create test environment");
    schemas
        .register(schema_builder::marker_schema())
        .expect("Failed to register marker schema");
    (db_ops, schemas)
}

pub fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Header and rows of a small city table.
pub fn city_table() -> (Vec<String>, Vec<Vec<String>>) {
    let header = strings(&["name", "population", "lat", "lng"]);
    let rows = vec![
        strings(&["Tokyo", "13960000", "35.68", "139.69"]),
        strings(&["Osaka", "2750000", "34.69", "135.50"]),
    ];
    (header, rows)
}
