//! Dataset graph: records connected through reference columns, and the
//! bounded walks over them.
//!
//! Both walks ([`GraphIterator`] over records, [`SchemaGraphIterator`] over
//! schemas) share the same termination rules. A walk stops after `max_depth`
//! hops, when the followed reference is empty or points nowhere, or when a node
//! would repeat. The node emitted last carries `done = true`.

use super::link::LinkChain;
use super::record::Dataset;
use super::schema::DatasetSchema;
use crate::cancel::Cancellation;
use crate::constants::MAX_DEPTH;
use crate::error::{PropertyError, PropertyResult};
use crate::ids::{DatasetFieldId, DatasetId, DatasetSchemaId};
use crate::value::{Value, ValueType};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Read access to dataset records and schemas.
pub trait DatasetSource {
    fn dataset(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>>;
    fn dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>>;
}

/// In-memory snapshot of dataset schemas and records.
#[derive(Debug, Clone, Default)]
pub struct DatasetGraph {
    schemas: HashMap<DatasetSchemaId, DatasetSchema>,
    datasets: HashMap<DatasetId, Dataset>,
}

impl DatasetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_schema(&mut self, schema: DatasetSchema) {
        self.schemas.insert(schema.id.clone(), schema);
    }

    pub fn insert_dataset(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.id.clone(), dataset);
    }

    pub fn schema(&self, id: &DatasetSchemaId) -> Option<&DatasetSchema> {
        self.schemas.get(id)
    }

    pub fn get(&self, id: &DatasetId) -> Option<&Dataset> {
        self.datasets.get(id)
    }

    /// Records of a schema, ordered by id.
    pub fn datasets_of(&self, schema: &DatasetSchemaId) -> Vec<&Dataset> {
        let mut records: Vec<_> = self
            .datasets
            .values()
            .filter(|d| &d.schema == schema)
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn remove_dataset(&mut self, id: &DatasetId) -> Option<Dataset> {
        self.datasets.remove(id)
    }

    /// Remove a schema together with its records. Returns the removed record ids.
    pub fn remove_schema(&mut self, id: &DatasetSchemaId) -> Vec<DatasetId> {
        self.schemas.remove(id);
        let mut removed: Vec<DatasetId> = self
            .datasets
            .values()
            .filter(|d| &d.schema == id)
            .map(|d| d.id.clone())
            .collect();
        removed.sort();
        for record in &removed {
            self.datasets.remove(record);
        }
        removed
    }
}

impl DatasetSource for DatasetGraph {
    fn dataset(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>> {
        Ok(self.datasets.get(id).cloned())
    }

    fn dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>> {
        Ok(self.schemas.get(id).cloned())
    }
}

/// One emitted node of a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStep<N> {
    pub node: N,
    /// True for the last node of the walk.
    pub done: bool,
}

fn check_depth(depth: i64) -> PropertyResult<usize> {
    if depth < 0 || depth > MAX_DEPTH as i64 {
        return Err(PropertyError::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(depth as usize)
}

/// How a walk moves from one node to the next.
trait Edges {
    type Id: Clone + Eq + Hash + ToString;
    type Node;

    fn load(&self, id: &Self::Id) -> PropertyResult<Option<Self::Node>>;
    fn id_of(node: &Self::Node) -> &Self::Id;
    fn next(
        &self,
        node: &Self::Node,
        field: Option<&DatasetFieldId>,
    ) -> PropertyResult<Option<Self::Id>>;
}

struct RecordEdges<'a> {
    source: &'a dyn DatasetSource,
}

impl Edges for RecordEdges<'_> {
    type Id = DatasetId;
    type Node = Dataset;

    fn load(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>> {
        self.source.dataset(id)
    }

    fn id_of(node: &Dataset) -> &DatasetId {
        &node.id
    }

    fn next(
        &self,
        node: &Dataset,
        field: Option<&DatasetFieldId>,
    ) -> PropertyResult<Option<DatasetId>> {
        let field = match field {
            Some(field) => field.clone(),
            None => match self.source.dataset_schema(&node.schema)? {
                Some(schema) => match schema.designated_reference_field() {
                    Some(f) => f.id.clone(),
                    None => return Ok(None),
                },
                None => return Ok(None),
            },
        };
        Ok(node.reference(&field).cloned())
    }
}

struct SchemaEdges<'a> {
    source: &'a dyn DatasetSource,
}

impl Edges for SchemaEdges<'_> {
    type Id = DatasetSchemaId;
    type Node = DatasetSchema;

    fn load(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>> {
        self.source.dataset_schema(id)
    }

    fn id_of(node: &DatasetSchema) -> &DatasetSchemaId {
        &node.id
    }

    fn next(
        &self,
        node: &DatasetSchema,
        field: Option<&DatasetFieldId>,
    ) -> PropertyResult<Option<DatasetSchemaId>> {
        let field = match field {
            Some(id) => node.field(id),
            None => node.designated_reference_field(),
        };
        Ok(field.and_then(|f| f.reference.clone()))
    }
}

/// Lazy walk state. Each call to `walk()` on an iterator starts a fresh one.
struct GraphWalk<'a, E: Edges> {
    edges: E,
    start: Option<E::Id>,
    max_depth: usize,
    path: Option<&'a [DatasetFieldId]>,
    cancellation: &'a Cancellation,
    visited: HashSet<E::Id>,
    current: Option<E::Node>,
    depth: usize,
    finished: bool,
}

impl<'a, E: Edges> GraphWalk<'a, E> {
    fn new(
        edges: E,
        start: E::Id,
        max_depth: usize,
        path: Option<&'a [DatasetFieldId]>,
        cancellation: &'a Cancellation,
    ) -> Self {
        Self {
            edges,
            start: Some(start),
            max_depth,
            path,
            cancellation,
            visited: HashSet::new(),
            current: None,
            depth: 0,
            finished: false,
        }
    }

    fn step(&mut self) -> PropertyResult<Option<GraphStep<E::Node>>> {
        if let Some(start) = self.start.take() {
            match self.edges.load(&start)? {
                Some(node) => self.current = Some(node),
                None => return Err(PropertyError::not_found("graph node", start.to_string())),
            }
        }

        let node = match self.current.take() {
            Some(node) => node,
            None => return Ok(None),
        };
        self.visited.insert(E::id_of(&node).clone());

        if let Some(next) = self.successor(&node)? {
            self.current = Some(next);
            self.depth += 1;
            return Ok(Some(GraphStep { node, done: false }));
        }

        self.finished = true;
        Ok(Some(GraphStep { node, done: true }))
    }

    fn successor(&self, node: &E::Node) -> PropertyResult<Option<E::Node>> {
        if self.depth >= self.max_depth {
            return Ok(None);
        }
        let field = match self.path {
            Some(path) => match path.get(self.depth) {
                Some(field) => Some(field),
                None => return Ok(None),
            },
            None => None,
        };
        let next_id = match self.edges.next(node, field)? {
            Some(id) => id,
            None => return Ok(None),
        };
        if self.visited.contains(&next_id) {
            crate::log_dataset_debug!("Cycle detected at {}", next_id.to_string());
            return Ok(None);
        }
        self.cancellation.check("graph traversal")?;
        self.edges.load(&next_id)
    }
}

impl<E: Edges> Iterator for GraphWalk<'_, E> {
    type Item = PropertyResult<GraphStep<E::Node>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(step)) => Some(Ok(step)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Bounded, restartable walk over dataset records.
///
/// Without an explicit path the walk follows each record's designated
/// reference column.
pub struct GraphIterator<'a> {
    source: &'a dyn DatasetSource,
    start: DatasetId,
    max_depth: usize,
    path: Option<Vec<DatasetFieldId>>,
    cancellation: Cancellation,
}

impl<'a> GraphIterator<'a> {
    /// Fails with `InvalidDepth` unless `max_depth` is within `[0, 3]`.
    pub fn new(source: &'a dyn DatasetSource, start: DatasetId, max_depth: i64) -> PropertyResult<Self> {
        Ok(Self {
            source,
            start,
            max_depth: check_depth(max_depth)?,
            path: None,
            cancellation: Cancellation::default(),
        })
    }

    /// Follow the given column at each hop instead of the designated one.
    #[must_use]
    pub fn along(mut self, path: Vec<DatasetFieldId>) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Start a fresh walk from the starting record.
    pub fn walk(&self) -> impl Iterator<Item = PropertyResult<GraphStep<Dataset>>> + '_ {
        GraphWalk::new(
            RecordEdges {
                source: self.source,
            },
            self.start.clone(),
            self.max_depth,
            self.path.as_deref(),
            &self.cancellation,
        )
    }

    /// Run a full walk and collect the visited records.
    pub fn collect_records(&self) -> PropertyResult<Vec<Dataset>> {
        self.walk().map(|step| step.map(|s| s.node)).collect()
    }
}

/// Schema-level counterpart of [`GraphIterator`], following reference
/// columns from schema to schema.
pub struct SchemaGraphIterator<'a> {
    source: &'a dyn DatasetSource,
    start: DatasetSchemaId,
    max_depth: usize,
    path: Option<Vec<DatasetFieldId>>,
    cancellation: Cancellation,
}

impl<'a> SchemaGraphIterator<'a> {
    pub fn new(
        source: &'a dyn DatasetSource,
        start: DatasetSchemaId,
        max_depth: i64,
    ) -> PropertyResult<Self> {
        Ok(Self {
            source,
            start,
            max_depth: check_depth(max_depth)?,
            path: None,
            cancellation: Cancellation::default(),
        })
    }

    #[must_use]
    pub fn along(mut self, path: Vec<DatasetFieldId>) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn walk(&self) -> impl Iterator<Item = PropertyResult<GraphStep<DatasetSchema>>> + '_ {
        GraphWalk::new(
            SchemaEdges {
                source: self.source,
            },
            self.start.clone(),
            self.max_depth,
            self.path.as_deref(),
            &self.cancellation,
        )
    }
}

/// Resolve a link chain to the value it currently points at.
///
/// The walk starts at `row_override` when given, otherwise at the record the
/// first hop names, and follows reference columns hop by hop. A missing record
/// or an empty reference yields `Ok(None)`.
pub fn resolve(
    source: &dyn DatasetSource,
    chain: &LinkChain,
    row_override: Option<&DatasetId>,
    cancellation: &Cancellation,
) -> PropertyResult<Option<Value>> {
    if chain.len() > MAX_DEPTH + 1 {
        return Err(PropertyError::invalid_link_chain(format!(
            "chain of {} hops exceeds the maximum of {}",
            chain.len(),
            MAX_DEPTH + 1
        )));
    }

    let mut current = match row_override.or(chain.first().dataset.as_ref()) {
        Some(id) => id.clone(),
        None => return Ok(None),
    };
    let mut visited = HashSet::new();
    let last = chain.len() - 1;

    for (index, hop) in chain.links().iter().enumerate() {
        cancellation.check("link resolution")?;
        if !visited.insert(current.clone()) {
            return Ok(None);
        }
        let record = match source.dataset(&current)? {
            Some(record) if record.schema == hop.dataset_schema => record,
            _ => {
                crate::log_dataset_debug!("Dangling link hop {} at record {}", index, current);
                return Ok(None);
            }
        };
        if index == last {
            return Ok(record.value(&hop.field).cloned());
        }
        current = match record.reference(&hop.field) {
            Some(next) => next.clone(),
            None => return Ok(None),
        };
    }
    Ok(None)
}

/// Check that a link chain follows actual reference edges of the schema graph
/// and ends on a column of the expected type.
pub fn validate_link_chain(
    source: &dyn DatasetSource,
    chain: &LinkChain,
    expected: ValueType,
) -> PropertyResult<()> {
    let hops = chain.links();
    if hops.len() > MAX_DEPTH + 1 {
        return Err(PropertyError::invalid_link_chain(format!(
            "chain of {} hops exceeds the maximum of {}",
            hops.len(),
            MAX_DEPTH + 1
        )));
    }

    let path: Vec<DatasetFieldId> = hops[..hops.len() - 1]
        .iter()
        .map(|hop| hop.field.clone())
        .collect();
    let walk = SchemaGraphIterator::new(source, chain.first().dataset_schema.clone(), path.len() as i64)?
        .along(path);

    let mut reached = Vec::with_capacity(hops.len());
    for step in walk.walk() {
        match step {
            Ok(step) => reached.push(step.node),
            Err(e) if e.is_not_found() => {
                return Err(PropertyError::invalid_link_chain(format!(
                    "unknown dataset schema {}",
                    chain.first().dataset_schema
                )))
            }
            Err(e) => return Err(e),
        }
    }

    if reached.len() != hops.len() {
        return Err(PropertyError::invalid_link_chain(format!(
            "hop {} does not follow a reference edge",
            reached.len()
        )));
    }

    for (hop, schema) in hops.iter().zip(&reached) {
        if schema.id != hop.dataset_schema {
            return Err(PropertyError::invalid_link_chain(format!(
                "expected schema {} but reference leads to {}",
                hop.dataset_schema, schema.id
            )));
        }
        if schema.field(&hop.field).is_none() {
            return Err(PropertyError::invalid_link_chain(format!(
                "field {} does not exist on dataset schema {}",
                hop.field, schema.id
            )));
        }
        if let Some(dataset) = &hop.dataset {
            match source.dataset(dataset)? {
                Some(record) if record.schema == hop.dataset_schema => {}
                Some(_) => {
                    return Err(PropertyError::invalid_link_chain(format!(
                        "dataset {} does not belong to schema {}",
                        dataset, hop.dataset_schema
                    )))
                }
                None => return Err(PropertyError::not_found("dataset", dataset)),
            }
        }
    }

    let last_hop = chain.last();
    let last_schema = &reached[reached.len() - 1];
    let field_type = last_schema
        .field(&last_hop.field)
        .map(|f| f.value_type)
        .ok_or_else(|| PropertyError::invalid_link_chain("missing final field"))?;
    if field_type != expected {
        return Err(PropertyError::invalid_link_chain(format!(
            "final field has type {} but the property field expects {}",
            field_type, expected
        )));
    }

    Ok(())
}
