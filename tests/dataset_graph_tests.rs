mod test_helpers;

use scene_property::cancel::Cancellation;
use scene_property::dataset::{resolve, GraphIterator, Link, LinkChain, SchemaGraphIterator};
use scene_property::error::{PropertyError, PropertyResult};
use scene_property::ids::{DatasetId, SceneId};
use scene_property::repository::{DatasetRepository, DatasetSchemaRepository};
use scene_property::value::Value;
use std::collections::HashSet;
use test_helpers::schema_builder::{graph_of, ring, self_referencing_schema};

#[test]
fn test_cycle_terminates_without_repeating() {
    let schema = self_referencing_schema(SceneId::new());
    for k in 1..=3usize {
        let records = ring(&schema, k, true);
        let graph = graph_of(&[&schema], &records);
        let iter = GraphIterator::new(&graph, records[0].id.clone(), 3).unwrap();
        let steps: Vec<_> = iter.walk().collect::<PropertyResult<_>>().unwrap();

        assert!(steps.len() <= k + 1, "cycle of {} took {} steps", k, steps.len());
        assert!(steps.last().unwrap().done);
        assert!(steps[..steps.len() - 1].iter().all(|s| !s.done));
        let unique: HashSet<DatasetId> = steps.iter().map(|s| s.node.id.clone()).collect();
        assert_eq!(unique.len(), steps.len());
    }
}

#[test]
fn test_depth_zero_yields_only_start() {
    let schema = self_referencing_schema(SceneId::new());
    let records = ring(&schema, 3, false);
    let graph = graph_of(&[&schema], &records);
    let iter = GraphIterator::new(&graph, records[0].id.clone(), 0).unwrap();
    let steps: Vec<_> = iter.walk().collect::<PropertyResult<_>>().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].node.id, records[0].id);
    assert!(steps[0].done);
}

#[test]
fn test_depth_bounds() {
    let schema = self_referencing_schema(SceneId::new());
    let records = ring(&schema, 5, false);
    let graph = graph_of(&[&schema], &records);
    for depth in [-5, -1, 4, 100] {
        assert!(matches!(
            GraphIterator::new(&graph, records[0].id.clone(), depth),
            Err(PropertyError::InvalidDepth { .. })
        ));
    }
    let iter = GraphIterator::new(&graph, records[0].id.clone(), 3).unwrap();
    assert_eq!(iter.collect_records().unwrap().len(), 4);
}

#[test]
fn test_walk_stops_at_empty_reference() {
    let schema = self_referencing_schema(SceneId::new());
    let records = ring(&schema, 2, false);
    let graph = graph_of(&[&schema], &records);
    let iter = GraphIterator::new(&graph, records[0].id.clone(), 3).unwrap();
    let steps: Vec<_> = iter.walk().collect::<PropertyResult<_>>().unwrap();
    assert_eq!(steps.len(), 2);
    assert!(steps[1].done);
}

#[test]
fn test_schema_walk_detects_self_reference() {
    let schema = self_referencing_schema(SceneId::new());
    let graph = graph_of(&[&schema], &[]);
    let iter = SchemaGraphIterator::new(&graph, schema.id.clone(), 3).unwrap();
    let steps: Vec<_> = iter.walk().collect::<PropertyResult<_>>().unwrap();
    assert_eq!(steps.len(), 1);
    assert!(steps[0].done);
}

#[test]
fn test_resolve_against_sled_store() {
    let (db_ops, _) = test_helpers::setup_store();
    let schema = self_referencing_schema(SceneId::new());
    let records = ring(&schema, 3, false);
    db_ops.save_dataset_schema(&schema).unwrap();
    db_ops.save_datasets(&records).unwrap();

    let next = schema.fields[0].id.clone();
    let name = schema.fields[1].id.clone();
    let chain = LinkChain::new(vec![
        Link::unqualified(schema.id.clone(), next.clone()),
        Link::unqualified(schema.id.clone(), next),
        Link::unqualified(schema.id.clone(), name),
    ])
    .unwrap();

    let value = resolve(&*db_ops, &chain, Some(&records[0].id), &Cancellation::new()).unwrap();
    assert_eq!(value, Some(Value::string("n2")));
    // Starting one record later runs off the end of the chain.
    let value = resolve(&*db_ops, &chain, Some(&records[1].id), &Cancellation::new()).unwrap();
    assert_eq!(value, None);
    // No starting record at all.
    assert_eq!(resolve(&*db_ops, &chain, None, &Cancellation::new()).unwrap(), None);
}

#[test]
fn test_overlong_chain_rejected() {
    let schema = self_referencing_schema(SceneId::new());
    let graph = graph_of(&[&schema], &[]);
    let hop = Link::unqualified(schema.id.clone(), schema.fields[0].id.clone());
    let chain = LinkChain::new(vec![hop; 5]).unwrap();
    assert!(matches!(
        resolve(&graph, &chain, Some(&DatasetId::new()), &Cancellation::new()),
        Err(PropertyError::InvalidLinkChain { .. })
    ));
}
