use super::field::Field;
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{FieldId, ItemId, SchemaGroupId};
use crate::schema::SchemaGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of fields conforming to one schema group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: ItemId,
    pub schema_group: SchemaGroupId,
    #[serde(default)]
    fields: BTreeMap<FieldId, Field>,
}

impl Group {
    #[must_use]
    pub fn new(schema_group: SchemaGroupId) -> Self {
        Self {
            id: ItemId::new(),
            schema_group,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.id.clone(), field);
        self
    }

    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn field_mut(&mut self, id: &FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.values_mut()
    }

    /// Return the field, creating an empty one if the schema declares it.
    pub fn get_or_create_field(
        &mut self,
        schema: &SchemaGroup,
        id: &FieldId,
    ) -> PropertyResult<(&mut Field, bool)> {
        if schema.field(id).is_none() {
            return Err(PropertyError::not_found("schema field", id));
        }
        let created = !self.fields.contains_key(id);
        let field = self
            .fields
            .entry(id.clone())
            .or_insert_with(|| Field::new(id.clone()));
        Ok((field, created))
    }

    /// True when the group has no non-empty field.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Field::is_empty)
    }

    /// Drop empty fields. Returns whether anything was removed.
    pub fn prune(&mut self) -> bool {
        let before = self.fields.len();
        self.fields.retain(|_, f| !f.is_empty());
        before != self.fields.len()
    }
}
