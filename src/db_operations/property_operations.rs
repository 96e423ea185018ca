use super::core::DbOperations;
use crate::error::PropertyResult;
use crate::ids::{PropertyId, SceneId};
use crate::property::Property;
use crate::repository::PropertyRepository;

impl PropertyRepository for DbOperations {
    fn find_property(&self, id: &PropertyId) -> PropertyResult<Option<Property>> {
        self.get_from_tree(&self.properties_tree, id.as_str())
    }

    fn save_property(&self, property: &Property) -> PropertyResult<()> {
        self.store_in_tree(&self.properties_tree, property.id.as_str(), property)
    }

    fn remove_property(&self, id: &PropertyId) -> PropertyResult<bool> {
        self.delete_from_tree(&self.properties_tree, id.as_str())
    }

    fn properties_by_scene(&self, scene: &SceneId) -> PropertyResult<Vec<Property>> {
        let all: Vec<Property> = self.list_items_in_tree(&self.properties_tree)?;
        Ok(all.into_iter().filter(|p| &p.scene == scene).collect())
    }
}
