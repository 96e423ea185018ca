use super::property_schema::PropertySchema;
use super::validator::validate_schema;
use crate::error::{PropertyError, PropertyResult};
use crate::ids::PropertySchemaId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of property schemas.
///
/// Schemas are immutable once registered: registering the same definition
/// again is a no-op, a different definition under an existing id fails.
#[derive(Debug, Default)]
pub struct SchemaStore {
    schemas: RwLock<HashMap<PropertySchemaId, Arc<PropertySchema>>>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a schema.
    pub fn register(&self, schema: PropertySchema) -> PropertyResult<Arc<PropertySchema>> {
        validate_schema(&schema)?;

        let mut schemas = self.write();
        if let Some(existing) = schemas.get(&schema.id) {
            if **existing != schema {
                return Err(PropertyError::SchemaImmutable {
                    id: schema.id.to_string(),
                });
            }
            return Ok(existing.clone());
        }

        crate::log_property_debug!("Registered property schema {}", schema.id);
        let schema = Arc::new(schema);
        schemas.insert(schema.id.clone(), schema.clone());
        Ok(schema)
    }

    pub fn get(&self, id: &PropertySchemaId) -> PropertyResult<Arc<PropertySchema>> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| PropertyError::not_found("property schema", id))
    }

    pub fn contains(&self, id: &PropertySchemaId) -> bool {
        self.read().contains_key(id)
    }

    /// Unregister a schema. Returns whether it was present.
    pub fn remove(&self, id: &PropertySchemaId) -> bool {
        self.write().remove(id).is_some()
    }

    pub fn ids(&self) -> Vec<PropertySchemaId> {
        let mut ids: Vec<_> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PropertySchemaId, Arc<PropertySchema>>> {
        self.schemas.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PropertySchemaId, Arc<PropertySchema>>> {
        self.schemas.write().unwrap_or_else(|e| e.into_inner())
    }
}
