use crate::dataset::LinkChain;
use crate::ids::{DatasetId, FieldId, ItemId, PropertyId, PropertySchemaId, SchemaGroupId};
use crate::property::Locator;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which layer a merged field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Original,
    Parent,
    Default,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedField {
    pub id: FieldId,
    pub value_type: ValueType,
    /// Effective value: the literal, or what the link resolved to.
    pub value: Option<Value>,
    pub links: Option<LinkChain>,
    pub source: FieldSource,
    /// The original field shadows a non-empty parent field.
    pub overridden: bool,
}

impl MergedField {
    pub fn is_linked(&self) -> bool {
        self.links.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedGroup {
    pub schema_group: SchemaGroupId,
    pub original: Option<ItemId>,
    pub parent: Option<ItemId>,
    pub fields: Vec<MergedField>,
}

impl MergedGroup {
    pub fn field(&self, id: &FieldId) -> Option<&MergedField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn value(&self, id: &FieldId) -> Option<&Value> {
        self.field(id).and_then(|f| f.value.as_ref())
    }

    /// True when the group was merged from the given source group.
    pub fn has_source(&self, id: &ItemId) -> bool {
        self.original.as_ref() == Some(id) || self.parent.as_ref() == Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedList {
    pub schema_group: SchemaGroupId,
    pub original: Option<ItemId>,
    pub parent: Option<ItemId>,
    pub items: Vec<MergedGroup>,
}

impl MergedList {
    pub fn item(&self, id: &ItemId) -> Option<&MergedGroup> {
        self.items.iter().find(|g| g.has_source(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergedItem {
    Group(MergedGroup),
    List(MergedList),
}

impl MergedItem {
    pub fn schema_group(&self) -> &SchemaGroupId {
        match self {
            Self::Group(g) => &g.schema_group,
            Self::List(l) => &l.schema_group,
        }
    }

    pub fn as_group(&self) -> Option<&MergedGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&MergedList> {
        match self {
            Self::List(l) => Some(l),
            Self::Group(_) => None,
        }
    }

    fn groups(&self) -> Vec<&MergedGroup> {
        match self {
            Self::Group(g) => vec![g],
            Self::List(l) => l.items.iter().collect(),
        }
    }
}

/// Read-only view of an original property layered over its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedProperty {
    pub schema: PropertySchemaId,
    pub original: Option<PropertyId>,
    pub parent: Option<PropertyId>,
    /// Row used for links whose first hop names no record.
    pub linked_dataset: Option<DatasetId>,
    pub items: Vec<MergedItem>,
}

impl MergedProperty {
    pub fn item(&self, schema_group: &SchemaGroupId) -> Option<&MergedItem> {
        self.items.iter().find(|i| i.schema_group() == schema_group)
    }

    pub fn group(&self, schema_group: &SchemaGroupId) -> Option<&MergedGroup> {
        self.item(schema_group).and_then(MergedItem::as_group)
    }

    pub fn list(&self, schema_group: &SchemaGroupId) -> Option<&MergedList> {
        self.item(schema_group).and_then(MergedItem::as_list)
    }

    /// Look up a field by locator. List entries are matched against the ids
    /// of either source group.
    pub fn field(&self, locator: &Locator) -> Option<&MergedField> {
        let field = locator.field.as_ref()?;
        let group = match self.item(&locator.schema_group)? {
            MergedItem::Group(g) => g,
            MergedItem::List(l) => l.item(locator.item.as_ref()?)?,
        };
        group.field(field)
    }

    /// Every dataset record the view depends on, sorted and unique.
    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut ids: BTreeSet<DatasetId> = self
            .items
            .iter()
            .flat_map(MergedItem::groups)
            .flat_map(|g| g.fields.iter())
            .filter_map(|f| f.links.as_ref())
            .flat_map(|chain| chain.dataset_ids().cloned())
            .collect();
        ids.extend(self.linked_dataset.iter().cloned());
        ids.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
