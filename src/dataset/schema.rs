use crate::ids::{DatasetFieldId, DatasetSchemaId, SceneId};
use crate::value::ValueType;
use serde::{Deserialize, Serialize};

/// A column of a dataset schema. A reference column holds the id of a record
/// of another dataset schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchemaField {
    pub id: DatasetFieldId,
    pub name: String,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<DatasetSchemaId>,
}

impl DatasetSchemaField {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: DatasetFieldId::new(),
            name: name.into(),
            value_type,
            reference: None,
        }
    }

    /// Creates a reference column pointing at records of `target`.
    #[must_use]
    pub fn reference(name: impl Into<String>, target: DatasetSchemaId) -> Self {
        Self {
            reference: Some(target),
            ..Self::new(name, ValueType::Ref)
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Typed description of a table of records owned by a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub id: DatasetSchemaId,
    pub scene: SceneId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub fields: Vec<DatasetSchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_field: Option<DatasetFieldId>,
}

impl DatasetSchema {
    #[must_use]
    pub fn new(scene: SceneId, name: impl Into<String>) -> Self {
        Self {
            id: DatasetSchemaId::new(),
            scene,
            name: name.into(),
            source: None,
            fields: Vec::new(),
            representative_field: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: DatasetSchemaField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_representative_field(mut self, id: DatasetFieldId) -> Self {
        self.representative_field = Some(id);
        self
    }

    pub fn field(&self, id: &DatasetFieldId) -> Option<&DatasetSchemaField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&DatasetSchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The reference column graph walks follow when no explicit path is given:
    /// the first reference column in field order.
    pub fn designated_reference_field(&self) -> Option<&DatasetSchemaField> {
        self.fields.iter().find(|f| f.is_reference())
    }

    pub fn representative(&self) -> Option<&DatasetSchemaField> {
        self.representative_field
            .as_ref()
            .and_then(|id| self.field(id))
    }

    /// First column of the given type, used for automatic linking.
    pub fn first_field_of_type(&self, value_type: ValueType) -> Option<&DatasetSchemaField> {
        self.fields.iter().find(|f| f.value_type == value_type)
    }
}
