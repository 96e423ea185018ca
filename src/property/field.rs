use crate::dataset::LinkChain;
use crate::error::PropertyResult;
use crate::ids::FieldId;
use crate::schema::SchemaField;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A field of a property group.
///
/// While a link chain is attached it is authoritative: the stored literal is
/// ignored for reads but kept, so that unlinking restores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    links: Option<LinkChain>,
}

impl Field {
    #[must_use]
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            value: None,
            links: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// The stored literal, regardless of any attached link.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn links(&self) -> Option<&LinkChain> {
        self.links.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.links.is_some()
    }

    /// A field is empty when it holds neither a literal nor a link.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.links.is_none()
    }

    /// Type-check and store a literal. Any attached link is dropped.
    pub fn update(&mut self, value: Value, schema: &SchemaField) -> PropertyResult<()> {
        value.check(schema.id.as_str(), schema.value_type)?;
        self.value = Some(value);
        self.links = None;
        Ok(())
    }

    pub fn link(&mut self, links: LinkChain) {
        self.links = Some(links);
    }

    /// Detach the link. Returns whether one was attached.
    pub fn unlink(&mut self) -> bool {
        self.links.take().is_some()
    }

    /// Clear literal and link. Returns whether anything was cleared.
    pub fn clear(&mut self) -> bool {
        let changed = !self.is_empty();
        self.value = None;
        self.links = None;
        changed
    }

    pub(crate) fn links_mut(&mut self) -> Option<&mut LinkChain> {
        self.links.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Link;
    use crate::error::PropertyError;
    use crate::ids::{DatasetFieldId, DatasetSchemaId};
    use crate::value::ValueType;

    fn chain() -> LinkChain {
        LinkChain::single(Link::unqualified(DatasetSchemaId::new(), DatasetFieldId::new()))
    }

    #[test]
    fn test_update_checks_type_and_clears_link() {
        let schema = SchemaField::new("title", ValueType::String);
        let mut field = Field::new(schema.id.clone());
        field.link(chain());

        let err = field.update(Value::Number(1.0), &schema).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValueType { .. }));
        assert!(field.is_linked());

        field.update(Value::string("A"), &schema).unwrap();
        assert!(!field.is_linked());
        assert_eq!(field.value(), Some(&Value::string("A")));
    }

    #[test]
    fn test_unlink_restores_literal() {
        let mut field = Field::new("title".into()).with_value(Value::string("A"));
        field.link(chain());
        assert!(field.unlink());
        assert_eq!(field.value(), Some(&Value::string("A")));
        assert!(!field.unlink());
    }

    #[test]
    fn test_emptiness() {
        let mut field = Field::new("title".into());
        assert!(field.is_empty());
        field.link(chain());
        assert!(!field.is_empty());
        assert!(field.clear());
        assert!(field.is_empty());
    }
}
