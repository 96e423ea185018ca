use crate::ids::{FieldId, ItemId, SchemaGroupId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized form of a locator: `(schemaGroupID, itemID | null, fieldID | null)`.
pub type LocatorTuple = (SchemaGroupId, Option<ItemId>, Option<FieldId>);

/// Address of a group, list entry or field within a property.
///
/// Without a field the locator addresses a group or group list; with an item
/// it addresses one entry of a list; with both it addresses a single field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LocatorTuple", into = "LocatorTuple")]
pub struct Locator {
    pub schema_group: SchemaGroupId,
    pub item: Option<ItemId>,
    pub field: Option<FieldId>,
}

impl Locator {
    #[must_use]
    pub fn group(schema_group: impl Into<SchemaGroupId>) -> Self {
        Self {
            schema_group: schema_group.into(),
            item: None,
            field: None,
        }
    }

    #[must_use]
    pub fn field(schema_group: impl Into<SchemaGroupId>, field: impl Into<FieldId>) -> Self {
        Self::group(schema_group).with_field(field)
    }

    #[must_use]
    pub fn item(schema_group: impl Into<SchemaGroupId>, item: ItemId) -> Self {
        Self::group(schema_group).with_item(item)
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<FieldId>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// True when the locator addresses a single field.
    pub fn is_field(&self) -> bool {
        self.field.is_some()
    }
}

impl From<LocatorTuple> for Locator {
    fn from((schema_group, item, field): LocatorTuple) -> Self {
        Self {
            schema_group,
            item,
            field,
        }
    }
}

impl From<Locator> for LocatorTuple {
    fn from(locator: Locator) -> Self {
        (locator.schema_group, locator.item, locator.field)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item = self.item.as_ref().map(ItemId::as_str).unwrap_or("-");
        let field = self.field.as_ref().map(FieldId::as_str).unwrap_or("-");
        write!(f, "({}, {}, {})", self.schema_group, item, field)
    }
}
