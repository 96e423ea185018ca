use super::property_schema::PropertySchema;
use crate::error::{PropertyError, PropertyResult};
use std::collections::HashSet;

/// Validates a [`PropertySchema`] before it is registered.
///
/// Group ids must be unique within the schema and field ids unique within
/// their group. The representative field must exist and every default value
/// must match the declared field type.
pub fn validate_schema(schema: &PropertySchema) -> PropertyResult<()> {
    if schema.id.as_str().is_empty() {
        return Err(PropertyError::invalid_schema(
            &schema.id,
            "schema id cannot be empty",
        ));
    }

    let mut group_ids = HashSet::new();
    for group in &schema.groups {
        if !group_ids.insert(&group.id) {
            return Err(PropertyError::invalid_schema(
                &schema.id,
                format!("duplicate group id '{}'", group.id),
            ));
        }

        let mut field_ids = HashSet::new();
        for field in &group.fields {
            if !field_ids.insert(&field.id) {
                return Err(PropertyError::invalid_schema(
                    &schema.id,
                    format!("duplicate field id '{}' in group '{}'", field.id, group.id),
                ));
            }
            if let Some(default) = &field.default {
                default.check(field.id.as_str(), field.value_type).map_err(|e| {
                    PropertyError::invalid_schema(&schema.id, format!("bad default: {}", e))
                })?;
            }
        }

        if let Some(rep) = &group.representative_field {
            if group.field(rep).is_none() {
                return Err(PropertyError::invalid_schema(
                    &schema.id,
                    format!(
                        "representative field '{}' is not a field of group '{}'",
                        rep, group.id
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaField, SchemaGroup};
    use crate::value::{Value, ValueType};

    fn base() -> PropertySchema {
        PropertySchema::new("marker").with_group(
            SchemaGroup::new("default")
                .with_field(SchemaField::new("title", ValueType::String))
                .with_representative_field("title"),
        )
    }

    #[test]
    fn test_valid_schema() {
        assert!(validate_schema(&base()).is_ok());
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let schema = base().with_group(SchemaGroup::new("default"));
        assert!(matches!(
            validate_schema(&schema),
            Err(PropertyError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = PropertySchema::new("marker").with_group(
            SchemaGroup::new("default")
                .with_field(SchemaField::new("a", ValueType::String))
                .with_field(SchemaField::new("a", ValueType::Number)),
        );
        assert!(validate_schema(&schema).is_err());
    }

    #[test]
    fn test_missing_representative_rejected() {
        let schema = PropertySchema::new("marker")
            .with_group(SchemaGroup::list("items").with_representative_field("name"));
        assert!(validate_schema(&schema).is_err());
    }

    #[test]
    fn test_default_must_match_type() {
        let schema = PropertySchema::new("marker").with_group(
            SchemaGroup::new("default").with_field(
                SchemaField::new("size", ValueType::Number).with_default(Value::string("big")),
            ),
        );
        assert!(validate_schema(&schema).is_err());
    }
}
