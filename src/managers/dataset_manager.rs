use super::in_transaction;
use crate::config::TraversalConfig;
use crate::constants::DEFAULT_MAX_DEPTH;
use crate::dataset::{
    guess_schema, rows_to_datasets, schema_for_sync, Dataset, DatasetSchema, DatasetSource, GraphIterator,
};
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetId, DatasetSchemaId, SceneId};
use crate::property::DatasetMigration;
use crate::repository::{DatasetRepository, DatasetSchemaRepository, PropertyRepository, Store};
use crate::scene_lock::{LockState, ScenePermit, SceneLocks};
use std::collections::HashMap;
use std::sync::Arc;

/// Imports, replaces and removes the datasets of a scene, keeping property
/// links in step.
pub struct DatasetManager<S: Store> {
    store: Arc<S>,
    locks: SceneLocks<S>,
    max_depth: usize,
}

impl<S: Store> DatasetManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        let locks = SceneLocks::new(Arc::clone(&store));
        Self {
            store,
            locks,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_traversal(mut self, traversal: &TraversalConfig) -> Self {
        self.max_depth = traversal.max_depth;
        self
    }

    pub fn find_schema(&self, id: &DatasetSchemaId) -> PropertyResult<DatasetSchema> {
        self.store
            .find_dataset_schema(id)?
            .ok_or_else(|| PropertyError::not_found("dataset schema", id))
    }

    /// Records reachable from `start` through designated reference columns,
    /// starting with `start` itself.
    pub fn related(&self, start: &DatasetId) -> PropertyResult<Vec<Dataset>> {
        let source: &dyn DatasetSource = &*self.store;
        GraphIterator::new(source, start.clone(), self.max_depth as i64)?.collect_records()
    }

    /// Guess a schema for the rows and store it with its records. The scene
    /// is held in `DatasetSyncing` for the duration.
    pub fn import(
        &self,
        scene: &SceneId,
        name: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> PropertyResult<(DatasetSchema, Vec<Dataset>)> {
        self.locks.run_locked(scene, LockState::DatasetSyncing, |_| {
            let schema = guess_schema(scene.clone(), name, header, rows)?;
            let datasets = rows_to_datasets(&schema, header, rows)?;
            in_transaction(&*self.store, |scope| {
                scope.save_dataset_schema(&schema)?;
                scope.save_datasets(&datasets)
            })?;
            crate::log_dataset_info!(
                "Imported {} rows into dataset schema {}",
                datasets.len(),
                schema.id
            );
            Ok((schema, datasets))
        })
    }

    /// Remove a schema, its records and every property link through it.
    /// Returns the removed record ids.
    pub fn remove_schema(&self, permit: &ScenePermit, id: &DatasetSchemaId) -> PropertyResult<Vec<DatasetId>> {
        let schema = self.find_schema(id)?;
        permit.covers(&schema.scene)?;
        in_transaction(&*self.store, |scope| {
            self.locks.verify(permit)?;
            let removed = scope.remove_datasets_by_schema(id)?;
            scope.remove_dataset_schema(id)?;
            for mut property in scope.properties_by_scene(&schema.scene)? {
                if property.unlink_all_by_dataset_schema(id) {
                    scope.save_property(&property)?;
                }
            }
            crate::log_dataset_info!("Removed dataset schema {} and {} records", id, removed.len());
            Ok(removed)
        })
    }

    /// Replace a schema with a fresh import of the same table and move every
    /// property link onto the new ids.
    ///
    /// When every new cell still parses under the old column types those
    /// types are kept, otherwise the schema is guessed afresh. Columns are
    /// matched by name and type. Records are matched by the value of the
    /// representative column when both schemas have one, otherwise by
    /// position. Links that cannot be mapped are detached.
    pub fn sync(
        &self,
        scene: &SceneId,
        old_id: &DatasetSchemaId,
        header: &[String],
        rows: &[Vec<String>],
    ) -> PropertyResult<DatasetSchema> {
        self.locks.run_locked(scene, LockState::DatasetSyncing, |_| {
            let old = self.find_schema(old_id)?;
            if &old.scene != scene {
                return Err(PropertyError::not_found("dataset schema", old_id));
            }
            let schema = schema_for_sync(&old, header, rows)?;
            let datasets = rows_to_datasets(&schema, header, rows)?;
            let old_datasets = self.store.datasets_by_schema(old_id)?;
            let migration = build_migration(&old, &old_datasets, &schema, &datasets);

            in_transaction(&*self.store, |scope| {
                scope.save_dataset_schema(&schema)?;
                scope.save_datasets(&datasets)?;
                scope.remove_datasets_by_schema(old_id)?;
                scope.remove_dataset_schema(old_id)?;
                let mut migrated = 0;
                for mut property in scope.properties_by_scene(scene)? {
                    if property.migrate_dataset(&migration) {
                        scope.save_property(&property)?;
                        migrated += 1;
                    }
                }
                crate::log_dataset_info!(
                    "Synced dataset schema {} -> {} ({} properties migrated)",
                    old_id,
                    schema.id,
                    migrated
                );
                Ok(())
            })?;
            Ok(schema)
        })
    }
}

fn representative_key(schema: &DatasetSchema, dataset: &Dataset) -> Option<String> {
    let field = schema.representative()?;
    dataset
        .value(&field.id)
        .and_then(|v| serde_json::to_string(v).ok())
}

fn build_migration(
    old: &DatasetSchema,
    old_datasets: &[Dataset],
    new: &DatasetSchema,
    new_datasets: &[Dataset],
) -> DatasetMigration {
    let mut migration = DatasetMigration::new().with_schema(old.id.clone(), new.id.clone());
    for field in &old.fields {
        match new.field_by_name(&field.name) {
            Some(target) if target.value_type == field.value_type => {
                migration = migration.with_field(field.id.clone(), target.id.clone());
            }
            Some(target) => crate::log_dataset_warn!(
                "Column '{}' changed type from {} to {}, links to it are detached",
                field.name,
                field.value_type,
                target.value_type
            ),
            None => {}
        }
    }

    if old.representative().is_some() && new.representative().is_some() {
        let by_key: HashMap<String, &DatasetId> = new_datasets
            .iter()
            .filter_map(|d| representative_key(new, d).map(|k| (k, &d.id)))
            .collect();
        for dataset in old_datasets {
            if let Some(target) = representative_key(old, dataset).and_then(|k| by_key.get(&k)) {
                migration = migration.with_dataset(dataset.id.clone(), (*target).clone());
            }
        }
    } else {
        for (from, to) in old_datasets.iter().zip(new_datasets) {
            migration = migration.with_dataset(from.id.clone(), to.id.clone());
        }
    }
    migration
}
