use super::in_transaction;
use crate::dataset::{DatasetSource, LinkChain};
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetId, PropertyId, PropertySchemaId, SceneId};
use crate::merge::{MergedProperty, Merger};
use crate::property::{FieldLocation, ListPosition, Locator, Property};
use crate::repository::{PropertyRepository, Store};
use crate::scene_lock::{ScenePermit, SceneLocks};
use crate::schema::{PropertySchema, SchemaStore};
use crate::value::Value;
use std::sync::Arc;

/// Loads, mutates and persists properties.
pub struct PropertyManager<S: Store> {
    store: Arc<S>,
    schemas: Arc<SchemaStore>,
    locks: SceneLocks<S>,
}

impl<S: Store> PropertyManager<S> {
    pub fn new(store: Arc<S>, schemas: Arc<SchemaStore>) -> Self {
        let locks = SceneLocks::new(Arc::clone(&store));
        Self {
            store,
            schemas,
            locks,
        }
    }

    pub fn find(&self, id: &PropertyId) -> PropertyResult<Property> {
        self.store
            .find_property(id)?
            .ok_or_else(|| PropertyError::not_found("property", id))
    }

    pub fn create(
        &self,
        permit: &ScenePermit,
        scene: SceneId,
        schema: &PropertySchemaId,
    ) -> PropertyResult<Property> {
        permit.covers(&scene)?;
        self.schemas.get(schema)?;
        let property = Property::new(scene, schema.clone());
        in_transaction(&*self.store, |scope| {
            self.locks.verify(permit)?;
            scope.save_property(&property)
        })?;
        crate::log_property_info!("Created property {} with schema {}", property.id, schema);
        Ok(property)
    }

    pub fn remove(&self, permit: &ScenePermit, id: &PropertyId) -> PropertyResult<bool> {
        in_transaction(&*self.store, |scope| {
            let Some(property) = scope.find_property(id)? else {
                return Ok(false);
            };
            permit.covers(&property.scene)?;
            self.locks.verify(permit)?;
            scope.remove_property(id)
        })
    }

    /// Load a property, apply `f` and save it, all in one transaction.
    fn mutate<T>(
        &self,
        permit: &ScenePermit,
        id: &PropertyId,
        f: impl FnOnce(&mut Property, &PropertySchema, &dyn DatasetSource) -> PropertyResult<T>,
    ) -> PropertyResult<T> {
        in_transaction(&*self.store, |scope| {
            let mut property = scope
                .find_property(id)?
                .ok_or_else(|| PropertyError::not_found("property", id))?;
            permit.covers(&property.scene)?;
            self.locks.verify(permit)?;
            let schema = self.schemas.get(&property.schema)?;
            let result = f(&mut property, &schema, scope.as_source())?;
            scope.save_property(&property)?;
            Ok(result)
        })
    }

    pub fn update_value(
        &self,
        permit: &ScenePermit,
        id: &PropertyId,
        locator: &Locator,
        value: Value,
    ) -> PropertyResult<FieldLocation> {
        self.mutate(permit, id, |p, schema, _| p.update_value(schema, locator, value))
    }

    pub fn remove_field(&self, permit: &ScenePermit, id: &PropertyId, locator: &Locator) -> PropertyResult<bool> {
        self.mutate(permit, id, |p, schema, _| p.remove_field(schema, locator))
    }

    pub fn link_value(
        &self,
        permit: &ScenePermit,
        id: &PropertyId,
        locator: &Locator,
        chain: LinkChain,
    ) -> PropertyResult<FieldLocation> {
        self.mutate(permit, id, |p, schema, source| p.link(schema, source, locator, chain))
    }

    pub fn unlink_value(&self, permit: &ScenePermit, id: &PropertyId, locator: &Locator) -> PropertyResult<bool> {
        self.mutate(permit, id, |p, schema, _| p.unlink(schema, locator))
    }

    pub fn add_item(
        &self,
        permit: &ScenePermit,
        id: &PropertyId,
        locator: &Locator,
        index: Option<i64>,
        representative: Option<Value>,
    ) -> PropertyResult<ListPosition> {
        self.mutate(permit, id, |p, schema, _| {
            p.add_list_item(schema, locator, index, representative)
        })
    }

    pub fn move_item(
        &self,
        permit: &ScenePermit,
        id: &PropertyId,
        locator: &Locator,
        index: i64,
    ) -> PropertyResult<ListPosition> {
        self.mutate(permit, id, |p, schema, _| p.move_list_item(schema, locator, index))
    }

    pub fn remove_item(&self, permit: &ScenePermit, id: &PropertyId, locator: &Locator) -> PropertyResult<bool> {
        self.mutate(permit, id, |p, schema, _| p.remove_list_item(schema, locator))
    }

    pub fn prune(&self, permit: &ScenePermit, id: &PropertyId) -> PropertyResult<bool> {
        self.mutate(permit, id, |p, _, _| Ok(p.prune()))
    }

    /// Merged view of two stored properties. Needs no permit.
    pub fn merged(
        &self,
        schema: &PropertySchemaId,
        original: Option<&PropertyId>,
        parent: Option<&PropertyId>,
        row: Option<&DatasetId>,
    ) -> PropertyResult<MergedProperty> {
        let schema = self.schemas.get(schema)?;
        let original = original.map(|id| self.find(id)).transpose()?;
        let parent = parent.map(|id| self.find(id)).transpose()?;
        Merger::new(&schema, &*self.store).merge(original.as_ref(), parent.as_ref(), row)
    }
}
