//! Consolidated testing utilities for database setup and common test patterns

use crate::db_operations::DbOperations;
use crate::schema::SchemaStore;
use sled::Db;
use std::sync::Arc;

/// Temporary database creation shared by unit and integration tests
pub struct TestDatabaseFactory;

impl TestDatabaseFactory {
    /// Create a temporary sled database for testing
    pub fn create_temp_sled_db() -> Result<Db, sled::Error> {
        sled::Config::new().temporary(true).open()
    }

    /// Create temporary DbOperations for testing
    pub fn create_temp_db_ops() -> Result<DbOperations, Box<dyn std::error::Error>> {
        let db = Self::create_temp_sled_db()?;
        Ok(DbOperations::new(db)?)
    }

    /// Create complete test environment with a store and an empty schema registry
    pub fn create_test_environment() -> Result<(Arc<DbOperations>, Arc<SchemaStore>), Box<dyn std::error::Error>> {
        let db_ops = Arc::new(Self::create_temp_db_ops()?);
        Ok((db_ops, Arc::new(SchemaStore::new())))
    }
}
