use crate::ids::{DatasetFieldId, DatasetId, DatasetSchemaId};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record (row) of a dataset schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub schema: DatasetSchemaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub fields: BTreeMap<DatasetFieldId, Value>,
}

impl Dataset {
    #[must_use]
    pub fn new(schema: DatasetSchemaId) -> Self {
        Self {
            id: DatasetId::new(),
            schema,
            source: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, field: DatasetFieldId, value: Value) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn set_value(&mut self, field: DatasetFieldId, value: Value) {
        self.fields.insert(field, value);
    }

    pub fn value(&self, field: &DatasetFieldId) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The record id stored in a reference column, if any.
    pub fn reference(&self, field: &DatasetFieldId) -> Option<&DatasetId> {
        self.value(field).and_then(Value::as_ref_id)
    }
}
