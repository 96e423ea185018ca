//! The mutable property tree of one entity and its locator-addressed operations.
//!
//! Every operation takes the [`PropertySchema`] the property was created
//! from and fails with `SchemaMismatch` when handed a different one. Missing
//! groups and fields are materialized lazily on write; reads and removals on
//! absent targets are no-ops.

use super::field::Field;
use super::group::Group;
use super::group_list::GroupList;
use super::item::Item;
use super::locator::Locator;
use super::migration::{ChainMigration, DatasetMigration};
use crate::dataset::{validate_link_chain, DatasetSchema, DatasetSource, Link, LinkChain};
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetId, DatasetSchemaId, ItemId, PropertyId, PropertySchemaId, SceneId, SchemaGroupId};
use crate::schema::{PropertySchema, SchemaField, SchemaGroup};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Where a field lives after it was resolved or created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocation {
    /// The enclosing list, when the field belongs to a list entry.
    pub list: Option<ItemId>,
    pub group: ItemId,
    /// True when the field did not exist before the call.
    pub created: bool,
}

/// Position of a list entry after a structural list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPosition {
    pub list: ItemId,
    pub item: ItemId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub scene: SceneId,
    pub schema: PropertySchemaId,
    #[serde(default)]
    items: Vec<Item>,
}

impl Property {
    #[must_use]
    pub fn new(scene: SceneId, schema: PropertySchemaId) -> Self {
        Self {
            id: PropertyId::new(),
            scene,
            schema,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, schema_group: &SchemaGroupId) -> Option<&Item> {
        self.items.iter().find(|i| i.schema_group() == schema_group)
    }

    fn item_mut(&mut self, schema_group: &SchemaGroupId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.schema_group() == schema_group)
    }

    fn check_schema(&self, schema: &PropertySchema) -> PropertyResult<()> {
        if schema.id != self.schema {
            return Err(PropertyError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: schema.id.to_string(),
            });
        }
        Ok(())
    }

    /// Schema group and field a field locator points at.
    fn schema_field<'s>(
        schema: &'s PropertySchema,
        locator: &Locator,
    ) -> PropertyResult<(&'s SchemaGroup, &'s SchemaField)> {
        let field_id = locator
            .field
            .as_ref()
            .ok_or_else(|| PropertyError::invalid_locator(locator, "no field id"))?;
        let group = schema
            .group(&locator.schema_group)
            .ok_or_else(|| PropertyError::not_found("schema group", &locator.schema_group))?;
        let field = group
            .field(field_id)
            .ok_or_else(|| PropertyError::not_found("schema field", field_id))?;
        Ok((group, field))
    }

    /// The group a locator addresses, without creating anything.
    fn group_of(&self, locator: &Locator) -> Option<&Group> {
        match self.item(&locator.schema_group)? {
            Item::Group(g) => match &locator.item {
                Some(id) if id != &g.id => None,
                _ => Some(g),
            },
            Item::List(l) => l.group(locator.item.as_ref()?),
        }
    }

    fn group_of_mut(&mut self, locator: &Locator) -> Option<&mut Group> {
        match self.item_mut(&locator.schema_group)? {
            Item::Group(g) => match &locator.item {
                Some(id) if id != &g.id => None,
                _ => Some(g),
            },
            Item::List(l) => l.group_mut(locator.item.as_ref()?),
        }
    }

    /// The field a locator addresses, if it exists.
    pub fn field(&self, locator: &Locator) -> Option<&Field> {
        self.group_of(locator)?.field(locator.field.as_ref()?)
    }

    fn field_mut(&mut self, locator: &Locator) -> Option<&mut Field> {
        let field = locator.field.clone()?;
        self.group_of_mut(locator)?.field_mut(&field)
    }

    /// Insert a fresh item for `group`, keeping items in schema group order.
    fn insert_item(&mut self, schema: &PropertySchema, group: &SchemaGroup) -> usize {
        let rank = |id: &SchemaGroupId| schema.groups.iter().position(|g| &g.id == id);
        let own = rank(&group.id);
        let at = self
            .items
            .iter()
            .position(|i| rank(i.schema_group()) > own)
            .unwrap_or(self.items.len());
        let item = if group.is_list {
            Item::List(GroupList::new(group.id.clone()))
        } else {
            Item::Group(Group::new(group.id.clone()))
        };
        self.items.insert(at, item);
        at
    }

    fn item_index(&self, schema_group: &SchemaGroupId) -> Option<usize> {
        self.items.iter().position(|i| i.schema_group() == schema_group)
    }

    /// Resolve the field a locator addresses, creating the group and field if
    /// needed. List entries are never created here; a list locator must name
    /// an existing entry.
    pub fn get_or_create_field(
        &mut self,
        schema: &PropertySchema,
        locator: &Locator,
    ) -> PropertyResult<(&mut Field, FieldLocation)> {
        self.check_schema(schema)?;
        let (schema_group, schema_field) = Self::schema_field(schema, locator)?;

        if schema_group.is_list && locator.item.is_none() {
            return Err(PropertyError::invalid_locator(
                locator,
                "a list group needs an item id",
            ));
        }

        let index = match self.item_index(&schema_group.id) {
            Some(index) => index,
            None if schema_group.is_list => {
                return Err(PropertyError::not_found(
                    "list item",
                    locator.item.as_ref().map(ItemId::as_str).unwrap_or_default(),
                ))
            }
            None => self.insert_item(schema, schema_group),
        };

        let (list, group) = match &mut self.items[index] {
            Item::Group(g) => {
                if matches!(&locator.item, Some(id) if id != &g.id) {
                    return Err(PropertyError::invalid_locator(
                        locator,
                        "item id does not match the group",
                    ));
                }
                (None, g)
            }
            Item::List(l) => {
                let list_id = l.id.clone();
                let item = locator.item.as_ref().ok_or_else(|| {
                    PropertyError::invalid_locator(locator, "a list group needs an item id")
                })?;
                let group = l
                    .group_mut(item)
                    .ok_or_else(|| PropertyError::not_found("list item", item))?;
                (Some(list_id), group)
            }
        };

        let group_id = group.id.clone();
        let (field, created) = group.get_or_create_field(schema_group, &schema_field.id)?;
        Ok((
            field,
            FieldLocation {
                list,
                group: group_id,
                created,
            },
        ))
    }

    /// Store a literal value. The value is type-checked before anything is
    /// created; an attached link is dropped.
    pub fn update_value(
        &mut self,
        schema: &PropertySchema,
        locator: &Locator,
        value: Value,
    ) -> PropertyResult<FieldLocation> {
        self.check_schema(schema)?;
        let (_, schema_field) = Self::schema_field(schema, locator)?;
        value.check(schema_field.id.as_str(), schema_field.value_type)?;

        let (field, location) = self.get_or_create_field(schema, locator)?;
        field.update(value, schema_field)?;
        crate::log_property_debug!("Updated field {} of property {}", locator, self.id);
        Ok(location)
    }

    /// Clear the value and link of a field, leaving it empty in place.
    /// Returns false when the field does not exist or is already empty.
    pub fn remove_field(&mut self, schema: &PropertySchema, locator: &Locator) -> PropertyResult<bool> {
        self.check_schema(schema)?;
        Self::schema_field(schema, locator)?;
        Ok(self.field_mut(locator).map(Field::clear).unwrap_or(false))
    }

    /// Attach a link chain after checking it against the dataset schema graph.
    pub fn link(
        &mut self,
        schema: &PropertySchema,
        source: &dyn DatasetSource,
        locator: &Locator,
        chain: LinkChain,
    ) -> PropertyResult<FieldLocation> {
        self.check_schema(schema)?;
        let (_, schema_field) = Self::schema_field(schema, locator)?;
        validate_link_chain(source, &chain, schema_field.value_type)?;

        let (field, location) = self.get_or_create_field(schema, locator)?;
        field.link(chain);
        crate::log_property_debug!("Linked field {} of property {}", locator, self.id);
        Ok(location)
    }

    /// Detach the link of a field. Returns false when no link was attached.
    pub fn unlink(&mut self, schema: &PropertySchema, locator: &Locator) -> PropertyResult<bool> {
        self.check_schema(schema)?;
        Self::schema_field(schema, locator)?;
        Ok(self.field_mut(locator).map(Field::unlink).unwrap_or(false))
    }

    fn list_schema<'s>(
        schema: &'s PropertySchema,
        locator: &Locator,
    ) -> PropertyResult<&'s SchemaGroup> {
        let group = schema
            .group(&locator.schema_group)
            .ok_or_else(|| PropertyError::not_found("schema group", &locator.schema_group))?;
        if !group.is_list {
            return Err(PropertyError::invalid_locator(locator, "not a list group"));
        }
        Ok(group)
    }

    /// Insert a new entry into the list a locator addresses, creating the
    /// list if needed. The representative field of the entry may be
    /// pre-populated.
    pub fn add_list_item(
        &mut self,
        schema: &PropertySchema,
        locator: &Locator,
        index: Option<i64>,
        representative: Option<Value>,
    ) -> PropertyResult<ListPosition> {
        self.check_schema(schema)?;
        let schema_group = Self::list_schema(schema, locator)?;

        let mut group = Group::new(schema_group.id.clone());
        if let Some(value) = representative {
            let rep = schema_group.representative().ok_or_else(|| {
                PropertyError::invalid_schema(
                    &schema.id,
                    format!("group '{}' has no representative field", schema_group.id),
                )
            })?;
            value.check(rep.id.as_str(), rep.value_type)?;
            group = group.with_field(Field::new(rep.id.clone()).with_value(value));
        }

        let position = match self.item_index(&schema_group.id) {
            Some(position) => position,
            None => self.insert_item(schema, schema_group),
        };
        let list = self.items[position]
            .as_list_mut()
            .ok_or_else(|| PropertyError::invalid_locator(locator, "item is not a list"))?;
        let item = group.id.clone();
        let index = list.add(group, index);
        crate::log_property_debug!("Added list item {} at {} in {}", item, index, locator);
        Ok(ListPosition {
            list: list.id.clone(),
            item,
            index,
        })
    }

    /// Move a list entry, clamping the target index to the last position.
    pub fn move_list_item(
        &mut self,
        schema: &PropertySchema,
        locator: &Locator,
        index: i64,
    ) -> PropertyResult<ListPosition> {
        self.check_schema(schema)?;
        Self::list_schema(schema, locator)?;
        let item = locator
            .item
            .clone()
            .ok_or_else(|| PropertyError::invalid_locator(locator, "no item id"))?;
        let list = self
            .item_mut(&locator.schema_group)
            .and_then(Item::as_list_mut)
            .ok_or_else(|| PropertyError::not_found("list item", &item))?;
        let index = list
            .move_group(&item, index)
            .ok_or_else(|| PropertyError::not_found("list item", &item))?;
        Ok(ListPosition {
            list: list.id.clone(),
            item,
            index,
        })
    }

    /// Remove a list entry. Removing an absent entry returns false.
    pub fn remove_list_item(&mut self, schema: &PropertySchema, locator: &Locator) -> PropertyResult<bool> {
        self.check_schema(schema)?;
        Self::list_schema(schema, locator)?;
        let item = locator
            .item
            .as_ref()
            .ok_or_else(|| PropertyError::invalid_locator(locator, "no item id"))?;
        Ok(self
            .item_mut(&locator.schema_group)
            .and_then(Item::as_list_mut)
            .map(|list| list.remove(item))
            .unwrap_or(false))
    }

    /// Drop empty fields, then singleton groups and lists left with nothing in
    /// them. List entries are kept. Returns whether anything changed.
    pub fn prune(&mut self) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            changed |= item.prune();
        }
        let before = self.items.len();
        self.items.retain(|item| !item.is_empty());
        changed || before != self.items.len()
    }

    fn for_each_field_mut(&mut self, mut f: impl FnMut(&mut Field) -> bool) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            for group in item.groups_mut() {
                for field in group.fields_mut() {
                    changed |= f(field);
                }
            }
        }
        changed
    }

    fn fields(&self) -> impl Iterator<Item = &Field> {
        self.items
            .iter()
            .flat_map(|item| item.groups())
            .flat_map(|group| group.fields())
    }

    /// Every dataset record pinned by a link, sorted and unique.
    pub fn datasets(&self) -> Vec<DatasetId> {
        let ids: BTreeSet<DatasetId> = self
            .fields()
            .filter_map(Field::links)
            .flat_map(|chain| chain.dataset_ids().cloned())
            .collect();
        ids.into_iter().collect()
    }

    /// Detach every link that passes through a dataset schema.
    pub fn unlink_all_by_dataset_schema(&mut self, id: &DatasetSchemaId) -> bool {
        self.for_each_field_mut(|field| {
            field.links().is_some_and(|c| c.references_schema(id)) && field.unlink()
        })
    }

    /// Detach every link pinned to a dataset record.
    pub fn unlink_all_by_dataset(&mut self, id: &DatasetId) -> bool {
        self.for_each_field_mut(|field| {
            field.links().is_some_and(|c| c.references_dataset(id)) && field.unlink()
        })
    }

    /// Link every linkable schema field to the first column of the same type
    /// in a dataset row. Fields without a matching column are left alone.
    pub fn auto_link_field(
        &mut self,
        schema: &PropertySchema,
        dataset_schema: &DatasetSchema,
        dataset: &DatasetId,
    ) -> PropertyResult<bool> {
        self.check_schema(schema)?;
        let mut changed = false;
        for (group, field) in schema.linkable_fields() {
            let Some(column) = dataset_schema.first_field_of_type(field.value_type) else {
                continue;
            };
            let chain = LinkChain::single(Link::new(
                dataset_schema.id.clone(),
                Some(dataset.clone()),
                column.id.clone(),
            ));
            let locator = Locator::field(group.id.clone(), field.id.clone());
            let (target, _) = self.get_or_create_field(schema, &locator)?;
            target.link(chain);
            changed = true;
        }
        if changed {
            crate::log_property_info!("Auto-linked property {} to dataset {}", self.id, dataset);
        }
        Ok(changed)
    }

    /// Rewrite links after a dataset schema was replaced. Links that cannot be
    /// mapped are detached.
    pub fn migrate_dataset(&mut self, migration: &DatasetMigration) -> bool {
        self.for_each_field_mut(|field| {
            let outcome = match field.links_mut() {
                Some(chain) => migration.migrate(chain),
                None => return false,
            };
            match outcome {
                ChainMigration::Unchanged => false,
                ChainMigration::Rewritten => true,
                ChainMigration::Dropped => field.unlink(),
            }
        })
    }

    /// Check that items and literal values agree with the schema.
    pub fn validate_schema(&self, schema: &PropertySchema) -> PropertyResult<()> {
        self.check_schema(schema)?;
        let mut seen: HashSet<&SchemaGroupId> = HashSet::new();
        for item in &self.items {
            let group_id = item.schema_group();
            if !seen.insert(group_id) {
                return Err(PropertyError::invalid_schema(
                    &schema.id,
                    format!("group '{}' appears more than once", group_id),
                ));
            }
            let schema_group = schema
                .group(group_id)
                .ok_or_else(|| PropertyError::not_found("schema group", group_id))?;
            if schema_group.is_list != item.is_list() {
                return Err(PropertyError::invalid_schema(
                    &schema.id,
                    format!("group '{}' has the wrong shape", group_id),
                ));
            }
            for group in item.groups() {
                for field in group.fields() {
                    let schema_field = schema_group
                        .field(&field.id)
                        .ok_or_else(|| PropertyError::not_found("schema field", &field.id))?;
                    if let Some(value) = field.value() {
                        value.check(field.id.as_str(), schema_field.value_type)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, DatasetGraph, DatasetSchemaField};
    use crate::schema::SchemaField;
    use crate::value::ValueType;

    fn schema() -> PropertySchema {
        PropertySchema::new("marker")
            .with_group(
                SchemaGroup::new("default")
                    .with_field(SchemaField::new("title", ValueType::String))
                    .with_field(SchemaField::new("location", ValueType::LatLng).linkable())
                    .with_field(SchemaField::new("size", ValueType::Number)),
            )
            .with_group(
                SchemaGroup::list("items")
                    .with_field(SchemaField::new("name", ValueType::String))
                    .with_representative_field("name"),
            )
    }

    fn property() -> Property {
        Property::new(SceneId::new(), "marker".into())
    }

    #[test]
    fn test_update_value_creates_group_and_field() {
        let schema = schema();
        let mut p = property();
        let loc = Locator::field("default", "title");
        let location = p.update_value(&schema, &loc, Value::string("A")).unwrap();
        assert!(location.created);
        assert_eq!(location.list, None);
        assert_eq!(p.field(&loc).unwrap().value(), Some(&Value::string("A")));

        let again = p.update_value(&schema, &loc, Value::string("B")).unwrap();
        assert!(!again.created);
        assert_eq!(again.group, location.group);
    }

    #[test]
    fn test_update_value_type_mismatch_creates_nothing() {
        let schema = schema();
        let mut p = property();
        let err = p
            .update_value(&schema, &Locator::field("default", "size"), Value::string("big"))
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValueType { .. }));
        assert!(p.items().is_empty());
    }

    #[test]
    fn test_unknown_group_and_schema_mismatch() {
        let schema = schema();
        let mut p = property();
        assert!(p
            .update_value(&schema, &Locator::field("nope", "title"), Value::string("A"))
            .unwrap_err()
            .is_not_found());

        let other = PropertySchema::new("other");
        assert!(matches!(
            p.remove_field(&other, &Locator::field("default", "title")),
            Err(PropertyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_list_locator_requires_item() {
        let schema = schema();
        let mut p = property();
        let err = p
            .get_or_create_field(&schema, &Locator::field("items", "name"))
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidLocator { .. }));
    }

    #[test]
    fn test_list_operations() {
        let schema = schema();
        let mut p = property();
        let list = Locator::group("items");

        let first = p.add_list_item(&schema, &list, Some(-1), None).unwrap();
        assert_eq!(first.index, 0);
        let second = p
            .add_list_item(&schema, &list, None, Some(Value::string("second")))
            .unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.list, first.list);

        let name = Locator::item("items", second.item.clone()).with_field("name");
        assert_eq!(p.field(&name).unwrap().value(), Some(&Value::string("second")));

        let moved = p
            .move_list_item(&schema, &Locator::item("items", first.item.clone()), 10)
            .unwrap();
        assert_eq!(moved.index, 1);

        assert!(p
            .remove_list_item(&schema, &Locator::item("items", first.item.clone()))
            .unwrap());
        assert!(!p
            .remove_list_item(&schema, &Locator::item("items", first.item))
            .unwrap());
        assert!(p
            .move_list_item(&schema, &Locator::item("items", ItemId::new()), 0)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_add_to_non_list_group_fails() {
        let schema = schema();
        let mut p = property();
        assert!(matches!(
            p.add_list_item(&schema, &Locator::group("default"), None, None),
            Err(PropertyError::InvalidLocator { .. })
        ));
    }

    #[test]
    fn test_remove_field_and_prune() {
        let schema = schema();
        let mut p = property();
        let loc = Locator::field("default", "title");
        p.update_value(&schema, &loc, Value::string("A")).unwrap();
        p.add_list_item(&schema, &Locator::group("items"), None, None)
            .unwrap();

        assert!(p.remove_field(&schema, &loc).unwrap());
        assert!(!p.remove_field(&schema, &loc).unwrap());
        assert!(p.field(&loc).unwrap().is_empty());

        assert!(p.prune());
        assert!(p.item(&"default".into()).is_none());
        assert_eq!(p.item(&"items".into()).unwrap().as_list().unwrap().len(), 1);
        let snapshot = p.clone();
        assert!(!p.prune());
        assert_eq!(p, snapshot);
    }

    fn city_graph() -> (DatasetGraph, DatasetSchema, Dataset) {
        let schema = DatasetSchema::new(SceneId::new(), "cities")
            .with_field(DatasetSchemaField::new("name", ValueType::String))
            .with_field(DatasetSchemaField::new("location", ValueType::LatLng));
        let location = schema.field_by_name("location").unwrap().id.clone();
        let row = Dataset::new(schema.id.clone()).with_value(location, Value::lat_lng(35.0, 139.0));
        let mut graph = DatasetGraph::new();
        graph.insert_schema(schema.clone());
        graph.insert_dataset(row.clone());
        (graph, schema, row)
    }

    #[test]
    fn test_link_then_update_clears_link() {
        let schema = schema();
        let (graph, ds, row) = city_graph();
        let mut p = property();
        let loc = Locator::field("default", "location");
        let column = ds.field_by_name("location").unwrap().id.clone();
        let chain = LinkChain::single(Link::new(ds.id.clone(), Some(row.id.clone()), column));

        p.link(&schema, &graph, &loc, chain).unwrap();
        assert_eq!(p.datasets(), vec![row.id.clone()]);

        p.update_value(&schema, &loc, Value::lat_lng(1.0, 2.0)).unwrap();
        let (field, _) = p.get_or_create_field(&schema, &loc).unwrap();
        assert!(field.links().is_none());
    }

    #[test]
    fn test_link_type_mismatch_rejected() {
        let schema = schema();
        let (graph, ds, row) = city_graph();
        let mut p = property();
        let column = ds.field_by_name("name").unwrap().id.clone();
        let chain = LinkChain::single(Link::new(ds.id.clone(), Some(row.id), column));
        assert!(matches!(
            p.link(&schema, &graph, &Locator::field("default", "location"), chain),
            Err(PropertyError::InvalidLinkChain { .. })
        ));
    }

    #[test]
    fn test_auto_link_and_unlink_all() {
        let schema = schema();
        let (_, ds, row) = city_graph();
        let mut p = property();
        assert!(p.auto_link_field(&schema, &ds, &row.id).unwrap());
        assert!(p.field(&Locator::field("default", "location")).unwrap().is_linked());

        assert!(p.unlink_all_by_dataset(&row.id));
        assert!(!p.unlink_all_by_dataset_schema(&ds.id));
        assert!(p.datasets().is_empty());
    }

    #[test]
    fn test_validate_schema() {
        let schema = schema();
        let mut p = property();
        p.update_value(&schema, &Locator::field("default", "title"), Value::string("A"))
            .unwrap();
        assert!(p.validate_schema(&schema).is_ok());

        let mut foreign = Property::new(SceneId::new(), "marker".into());
        foreign.items.push(Item::List(GroupList::new("default".into())));
        assert!(matches!(
            foreign.validate_schema(&schema),
            Err(PropertyError::InvalidSchema { .. })
        ));
    }
}
