use scene_property::dataset::{Dataset, DatasetGraph, DatasetSchema, DatasetSchemaField};
use scene_property::ids::SceneId;
use scene_property::schema::{PropertySchema, SchemaField, SchemaGroup};
use scene_property::value::{Value, ValueType};

pub const MARKER: &str = "marker";

/// Singleton group "default" and list group "items".
pub fn marker_schema() -> PropertySchema {
    PropertySchema::new(MARKER)
        .with_group(
            SchemaGroup::new("default")
                .with_field(SchemaField::new("title", ValueType::String).with_default(Value::string("D")))
                .with_field(SchemaField::new("location", ValueType::LatLng).linkable())
                .with_field(SchemaField::new("size", ValueType::Number)),
        )
        .with_group(
            SchemaGroup::list("items")
                .with_field(SchemaField::new("name", ValueType::String))
                .with_field(SchemaField::new("count", ValueType::Number))
                .with_representative_field("name"),
        )
}

/// A schema with one reference column pointing at itself and a name column.
pub fn self_referencing_schema(scene: SceneId) -> DatasetSchema {
    let mut schema = DatasetSchema::new(scene, "nodes");
    let id = schema.id.clone();
    schema = schema
        .with_field(DatasetSchemaField::reference("next", id))
        .with_field(DatasetSchemaField::new("name", ValueType::String));
    schema
}

/// Records `n0 -> n1 -> ... -> n(len-1)`, closing the cycle back to `n0` when asked.
pub fn ring(schema: &DatasetSchema, len: usize, closed: bool) -> Vec<Dataset> {
    let next = schema.fields[0].id.clone();
    let name = schema.fields[1].id.clone();
    let mut records: Vec<Dataset> = (0..len)
        .map(|i| Dataset::new(schema.id.clone()).with_value(name.clone(), Value::string(format!("n{}", i))))
        .collect();
    for i in 0..len {
        let target = if i + 1 < len {
            Some(records[i + 1].id.clone())
        } else if closed {
            Some(records[0].id.clone())
        } else {
            None
        };
        if let Some(target) = target {
            records[i].set_value(next.clone(), Value::Ref(target));
        }
    }
    records
}

pub fn graph_of(schemas: &[&DatasetSchema], records: &[Dataset]) -> DatasetGraph {
    let mut graph = DatasetGraph::new();
    for schema in schemas {
        graph.insert_schema((*schema).clone());
    }
    for record in records {
        graph.insert_dataset(record.clone());
    }
    graph
}
