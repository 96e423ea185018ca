//! Read-time layering of an original property over its parent.
//!
//! Singleton groups are merged field by field: the original field when it is
//! non-empty, else the parent field, else the schema default. Lists are
//! merged by position, so entry `i` of the result combines entry `i` of both
//! sides and the result is as long as the longer list. Linked fields are
//! resolved through the dataset graph; a dangling link yields no value.

use super::merged::{FieldSource, MergedField, MergedGroup, MergedItem, MergedList, MergedProperty};
use crate::cancel::Cancellation;
use crate::dataset::{resolve, DatasetSource};
use crate::error::{PropertyError, PropertyResult};
use crate::ids::DatasetId;
use crate::logging::{LogFeature, PerformanceTimer};
use crate::property::{Field, Group, Item, Property};
use crate::schema::{PropertySchema, SchemaField, SchemaGroup};
use crate::value::Value;

pub struct Merger<'a> {
    schema: &'a PropertySchema,
    source: &'a dyn DatasetSource,
    cancellation: Cancellation,
}

impl<'a> Merger<'a> {
    pub fn new(schema: &'a PropertySchema, source: &'a dyn DatasetSource) -> Self {
        Self {
            schema,
            source,
            cancellation: Cancellation::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    fn check_schema(&self, property: Option<&Property>) -> PropertyResult<()> {
        match property {
            Some(p) if p.schema != self.schema.id => Err(PropertyError::SchemaMismatch {
                expected: self.schema.id.to_string(),
                actual: p.schema.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Merge `original` over `parent`. Both absent yields an empty view.
    pub fn merge(
        &self,
        original: Option<&Property>,
        parent: Option<&Property>,
        row: Option<&DatasetId>,
    ) -> PropertyResult<MergedProperty> {
        self.check_schema(original)?;
        self.check_schema(parent)?;

        let timer = PerformanceTimer::new(LogFeature::Merge, format!("merge {}", self.schema.id));
        let mut items = Vec::new();
        for schema_group in &self.schema.groups {
            self.cancellation.check("merge")?;
            let org = original.and_then(|p| p.item(&schema_group.id));
            let par = parent.and_then(|p| p.item(&schema_group.id));
            if org.is_none() && par.is_none() {
                continue;
            }
            let merged = if schema_group.is_list {
                MergedItem::List(self.merge_list(schema_group, org, par, row)?)
            } else {
                MergedItem::Group(self.merge_group(
                    schema_group,
                    org.and_then(Item::as_group),
                    par.and_then(Item::as_group),
                    row,
                )?)
            };
            items.push(merged);
        }

        crate::log_merge_debug!(
            "Merged {} groups of schema {} (original: {}, parent: {})",
            items.len(),
            self.schema.id,
            original.is_some(),
            parent.is_some()
        );
        timer.finish();

        Ok(MergedProperty {
            schema: self.schema.id.clone(),
            original: original.map(|p| p.id.clone()),
            parent: parent.map(|p| p.id.clone()),
            linked_dataset: row.cloned(),
            items,
        })
    }

    fn merge_list(
        &self,
        schema_group: &SchemaGroup,
        original: Option<&Item>,
        parent: Option<&Item>,
        row: Option<&DatasetId>,
    ) -> PropertyResult<MergedList> {
        let org = original.and_then(Item::as_list);
        let par = parent.and_then(Item::as_list);
        let org_groups = org.map(|l| l.groups()).unwrap_or_default();
        let par_groups = par.map(|l| l.groups()).unwrap_or_default();

        let len = org_groups.len().max(par_groups.len());
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            items.push(self.merge_group(schema_group, org_groups.get(i), par_groups.get(i), row)?);
        }
        Ok(MergedList {
            schema_group: schema_group.id.clone(),
            original: org.map(|l| l.id.clone()),
            parent: par.map(|l| l.id.clone()),
            items,
        })
    }

    fn merge_group(
        &self,
        schema_group: &SchemaGroup,
        original: Option<&Group>,
        parent: Option<&Group>,
        row: Option<&DatasetId>,
    ) -> PropertyResult<MergedGroup> {
        let fields = schema_group
            .fields
            .iter()
            .map(|schema_field| {
                self.merge_field(
                    schema_field,
                    original.and_then(|g| g.field(&schema_field.id)),
                    parent.and_then(|g| g.field(&schema_field.id)),
                    row,
                )
            })
            .collect::<PropertyResult<Vec<_>>>()?;
        Ok(MergedGroup {
            schema_group: schema_group.id.clone(),
            original: original.map(|g| g.id.clone()),
            parent: parent.map(|g| g.id.clone()),
            fields,
        })
    }

    fn merge_field(
        &self,
        schema_field: &SchemaField,
        original: Option<&Field>,
        parent: Option<&Field>,
        row: Option<&DatasetId>,
    ) -> PropertyResult<MergedField> {
        let original = original.filter(|f| !f.is_empty());
        let parent = parent.filter(|f| !f.is_empty());

        let (field, source) = match (original, parent) {
            (Some(f), _) => (Some(f), FieldSource::Original),
            (None, Some(f)) => (Some(f), FieldSource::Parent),
            (None, None) => (None, FieldSource::Empty),
        };

        let (value, links, source) = match field {
            Some(field) => (
                self.effective_value(field, schema_field, row)?,
                field.links().cloned(),
                source,
            ),
            None => match &schema_field.default {
                Some(default) => (Some(default.clone()), None, FieldSource::Default),
                None => (None, None, FieldSource::Empty),
            },
        };

        Ok(MergedField {
            id: schema_field.id.clone(),
            value_type: schema_field.value_type,
            value,
            links,
            source,
            overridden: original.is_some() && parent.is_some(),
        })
    }

    /// The literal, or the value the link resolves to. A resolved value of
    /// the wrong type counts as absent.
    fn effective_value(
        &self,
        field: &Field,
        schema_field: &SchemaField,
        row: Option<&DatasetId>,
    ) -> PropertyResult<Option<Value>> {
        let Some(chain) = field.links() else {
            return Ok(field.value().cloned());
        };
        let row = if chain.is_qualified() { None } else { row };
        match resolve(self.source, chain, row, &self.cancellation)? {
            Some(value) if value.value_type() != schema_field.value_type => {
                crate::log_merge_warn!(
                    "Link on field {} resolved to {} but the field is {}",
                    field.id,
                    value.value_type(),
                    schema_field.value_type
                );
                Ok(None)
            }
            Some(value) => Ok(Some(value)),
            None => {
                crate::log_merge_trace!("Link on field {} resolved to nothing", field.id);
                Ok(None)
            }
        }
    }
}

/// Merge with a fresh, never-cancelled handle.
pub fn merge(
    schema: &PropertySchema,
    source: &dyn DatasetSource,
    original: Option<&Property>,
    parent: Option<&Property>,
    row: Option<&DatasetId>,
) -> PropertyResult<MergedProperty> {
    Merger::new(schema, source).merge(original, parent, row)
}
