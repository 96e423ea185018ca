use super::core::DbOperations;
use crate::dataset::{Dataset, DatasetSchema, DatasetSource};
use crate::error::PropertyResult;
use crate::ids::{DatasetId, DatasetSchemaId, SceneId};
use crate::repository::{DatasetRepository, DatasetSchemaRepository};

impl DatasetSchemaRepository for DbOperations {
    fn find_dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>> {
        self.get_from_tree(&self.dataset_schemas_tree, id.as_str())
    }

    fn save_dataset_schema(&self, schema: &DatasetSchema) -> PropertyResult<()> {
        self.store_in_tree(&self.dataset_schemas_tree, schema.id.as_str(), schema)
    }

    fn remove_dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<bool> {
        self.delete_from_tree(&self.dataset_schemas_tree, id.as_str())
    }

    fn dataset_schemas_by_scene(&self, scene: &SceneId) -> PropertyResult<Vec<DatasetSchema>> {
        let all: Vec<DatasetSchema> = self.list_items_in_tree(&self.dataset_schemas_tree)?;
        Ok(all.into_iter().filter(|s| &s.scene == scene).collect())
    }
}

impl DatasetRepository for DbOperations {
    fn find_dataset(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>> {
        self.get_from_tree(&self.datasets_tree, id.as_str())
    }

    fn save_datasets(&self, datasets: &[Dataset]) -> PropertyResult<()> {
        for dataset in datasets {
            self.store_in_tree(&self.datasets_tree, dataset.id.as_str(), dataset)?;
        }
        crate::log_storage_debug!("Saved {} datasets", datasets.len());
        Ok(())
    }

    fn datasets_by_schema(&self, schema: &DatasetSchemaId) -> PropertyResult<Vec<Dataset>> {
        let all: Vec<Dataset> = self.list_items_in_tree(&self.datasets_tree)?;
        Ok(all.into_iter().filter(|d| &d.schema == schema).collect())
    }

    fn remove_datasets_by_schema(&self, schema: &DatasetSchemaId) -> PropertyResult<Vec<DatasetId>> {
        let ids: Vec<DatasetId> = self
            .datasets_by_schema(schema)?
            .into_iter()
            .map(|d| d.id)
            .collect();
        for id in &ids {
            self.delete_from_tree(&self.datasets_tree, id.as_str())?;
        }
        Ok(ids)
    }
}

impl DatasetSource for DbOperations {
    fn dataset(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>> {
        self.find_dataset(id)
    }

    fn dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>> {
        self.find_dataset_schema(id)
    }
}
