//! Dataset graph: typed tabular records, reference chains between them and the
//! bounded traversals used to resolve property links.

pub mod graph;
pub mod import;
pub mod link;
pub mod record;
pub mod schema;

pub use graph::{
    resolve, validate_link_chain, DatasetGraph, DatasetSource, GraphIterator, GraphStep,
    SchemaGraphIterator,
};
pub use import::{check_compatible, guess_schema, rows_to_datasets, schema_for_sync};
pub use link::{Link, LinkChain};
pub use record::Dataset;
pub use schema::{DatasetSchema, DatasetSchemaField};
