use crate::ids::{FieldId, PropertySchemaId, SchemaGroupId};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Declaration of a single field inside a schema group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: FieldId,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Receives an automatic dataset link when an entity is created from a dataset row
    #[serde(default)]
    pub linkable: bool,
}

impl SchemaField {
    #[must_use]
    pub fn new(id: impl Into<FieldId>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            value_type,
            default: None,
            title: None,
            linkable: false,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn linkable(mut self) -> Self {
        self.linkable = true;
        self
    }
}

/// Declaration of a group of fields. A list group is repeatable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGroup {
    pub id: SchemaGroupId,
    #[serde(default)]
    pub is_list: bool,
    pub fields: Vec<SchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_field: Option<FieldId>,
}

impl SchemaGroup {
    #[must_use]
    pub fn new(id: impl Into<SchemaGroupId>) -> Self {
        Self {
            id: id.into(),
            is_list: false,
            fields: Vec::new(),
            representative_field: None,
        }
    }

    #[must_use]
    pub fn list(id: impl Into<SchemaGroupId>) -> Self {
        Self {
            is_list: true,
            ..Self::new(id)
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_representative_field(mut self, id: impl Into<FieldId>) -> Self {
        self.representative_field = Some(id.into());
        self
    }

    pub fn field(&self, id: &FieldId) -> Option<&SchemaField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn representative(&self) -> Option<&SchemaField> {
        self.representative_field
            .as_ref()
            .and_then(|id| self.field(id))
    }
}

/// Immutable description of the groups and fields a property may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub id: PropertySchemaId,
    pub groups: Vec<SchemaGroup>,
}

impl PropertySchema {
    #[must_use]
    pub fn new(id: impl Into<PropertySchemaId>) -> Self {
        Self {
            id: id.into(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: SchemaGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn group(&self, id: &SchemaGroupId) -> Option<&SchemaGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn field(&self, group: &SchemaGroupId, field: &FieldId) -> Option<&SchemaField> {
        self.group(group).and_then(|g| g.field(field))
    }

    /// Fields flagged for automatic dataset linking, with their groups.
    pub fn linkable_fields(&self) -> impl Iterator<Item = (&SchemaGroup, &SchemaField)> {
        self.groups
            .iter()
            .filter(|g| !g.is_list)
            .flat_map(|g| g.fields.iter().filter(|f| f.linkable).map(move |f| (g, f)))
    }
}
