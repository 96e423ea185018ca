mod test_helpers;

use scene_property::dataset::{Dataset, DatasetSchema, DatasetSchemaField, Link, LinkChain};
use scene_property::error::PropertyError;
use scene_property::ids::{ItemId, SceneId};
use scene_property::property::{Item, Locator, Property};
use scene_property::value::{Value, ValueType};
use test_helpers::schema_builder::{graph_of, marker_schema, MARKER};

fn new_property() -> Property {
    Property::new(SceneId::new(), MARKER.into())
}

#[test]
fn test_prune_is_idempotent() {
    let schema = marker_schema();
    let mut p = new_property();
    p.update_value(&schema, &Locator::field("default", "title"), Value::string("A"))
        .unwrap();
    p.update_value(&schema, &Locator::field("default", "size"), Value::Number(3.0))
        .unwrap();
    let entry = p
        .add_list_item(&schema, &Locator::group("items"), None, None)
        .unwrap();
    let name = Locator::item("items", entry.item.clone()).with_field("name");
    p.update_value(&schema, &name, Value::string("x")).unwrap();
    p.remove_field(&schema, &name).unwrap();
    p.remove_field(&schema, &Locator::field("default", "size")).unwrap();

    let mut once = p.clone();
    once.prune();
    let mut twice = once.clone();
    assert!(!twice.prune());
    assert_eq!(once, twice);

    assert!(once.field(&Locator::field("default", "size")).is_none());
    assert!(once.field(&Locator::field("default", "title")).is_some());
    assert!(once.field(&name).is_none());
}

#[test]
fn test_prune_drops_empty_list() {
    let schema = marker_schema();
    let mut p = new_property();
    let entry = p
        .add_list_item(&schema, &Locator::group("items"), None, None)
        .unwrap();
    p.remove_list_item(&schema, &Locator::item("items", entry.item))
        .unwrap();
    assert!(p.prune());
    assert!(p.items().is_empty());
}

#[test]
fn test_update_after_link_clears_link() {
    let schema = marker_schema();
    let ds = DatasetSchema::new(SceneId::new(), "places")
        .with_field(DatasetSchemaField::new("where", ValueType::LatLng));
    let row = Dataset::new(ds.id.clone()).with_value(ds.fields[0].id.clone(), Value::lat_lng(1.0, 1.0));
    let graph = graph_of(&[&ds], &[row.clone()]);
    let loc = Locator::field("default", "location");

    let mut p = new_property();
    p.update_value(&schema, &loc, Value::lat_lng(5.0, 5.0)).unwrap();
    let chain = LinkChain::single(Link::new(ds.id.clone(), Some(row.id.clone()), ds.fields[0].id.clone()));
    p.link(&schema, &graph, &loc, chain).unwrap();

    let field = p.field(&loc).unwrap();
    assert!(field.is_linked());
    assert_eq!(field.value(), Some(&Value::lat_lng(5.0, 5.0)));

    p.update_value(&schema, &loc, Value::lat_lng(9.0, 9.0)).unwrap();
    let (field, location) = p.get_or_create_field(&schema, &loc).unwrap();
    assert!(field.links().is_none());
    assert_eq!(field.value(), Some(&Value::lat_lng(9.0, 9.0)));
    assert!(!location.created);
}

#[test]
fn test_unlink_keeps_literal_or_empties() {
    let schema = marker_schema();
    let ds = DatasetSchema::new(SceneId::new(), "places")
        .with_field(DatasetSchemaField::new("label", ValueType::String));
    let row = Dataset::new(ds.id.clone());
    let graph = graph_of(&[&ds], &[row.clone()]);
    let chain = LinkChain::single(Link::new(ds.id.clone(), Some(row.id), ds.fields[0].id.clone()));
    let loc = Locator::field("default", "title");

    let mut p = new_property();
    p.link(&schema, &graph, &loc, chain).unwrap();
    assert!(p.unlink(&schema, &loc).unwrap());
    assert!(p.field(&loc).unwrap().is_empty());
    assert!(!p.unlink(&schema, &loc).unwrap());
    assert!(!p.unlink(&schema, &Locator::field("default", "size")).unwrap());
}

#[test]
fn test_add_at_negative_index_on_empty_list_appends() {
    let schema = marker_schema();
    let mut p = new_property();
    let added = p
        .add_list_item(&schema, &Locator::group("items"), Some(-1), None)
        .unwrap();
    assert_eq!(added.index, 0);
    let list = p.item(&"items".into()).and_then(Item::as_list).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.groups()[0].id, added.item);
}

#[test]
fn test_move_beyond_length_clamps() {
    let schema = marker_schema();
    let mut p = new_property();
    let list = Locator::group("items");
    let ids: Vec<ItemId> = (0..3)
        .map(|_| p.add_list_item(&schema, &list, None, None).unwrap().item)
        .collect();

    let moved = p
        .move_list_item(&schema, &Locator::item("items", ids[0].clone()), 42)
        .unwrap();
    assert_eq!(moved.index, 2);
    let order: Vec<ItemId> = p
        .item(&"items".into())
        .and_then(Item::as_list)
        .unwrap()
        .groups()
        .iter()
        .map(|g| g.id.clone())
        .collect();
    assert_eq!(order, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
}

#[test]
fn test_representative_value_is_type_checked() {
    let schema = marker_schema();
    let mut p = new_property();
    let err = p
        .add_list_item(&schema, &Locator::group("items"), None, Some(Value::Number(1.0)))
        .unwrap_err();
    assert!(matches!(err, PropertyError::InvalidValueType { .. }));
}

#[test]
fn test_locator_round_trip_through_json() {
    let locator = Locator::item("items", ItemId::new()).with_field("name");
    let json = serde_json::to_string(&locator).unwrap();
    let back: Locator = serde_json::from_str(&json).unwrap();
    assert_eq!(back, locator);
}

#[test]
fn test_property_serialization_round_trip() {
    let schema = marker_schema();
    let mut p = new_property();
    p.update_value(&schema, &Locator::field("default", "title"), Value::string("A"))
        .unwrap();
    p.add_list_item(&schema, &Locator::group("items"), None, Some(Value::string("first")))
        .unwrap();
    let json = serde_json::to_value(&p).unwrap();
    let back: Property = serde_json::from_value(json).unwrap();
    assert_eq!(back, p);
    assert!(back.validate_schema(&schema).is_ok());
}
