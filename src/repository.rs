//! Persistence seams consumed by the managers.
//!
//! Each repository is keyed by opaque ids. [`Store`] bundles all of them with
//! transactions and dataset reads so a manager can be generic over one type.

use crate::dataset::{Dataset, DatasetSchema, DatasetSource};
use crate::error::PropertyResult;
use crate::ids::{DatasetId, DatasetSchemaId, PropertyId, SceneId};
use crate::property::Property;
use crate::scene_lock::{LockState, SceneLockRecord};

pub trait PropertyRepository: Send + Sync {
    fn find_property(&self, id: &PropertyId) -> PropertyResult<Option<Property>>;
    fn save_property(&self, property: &Property) -> PropertyResult<()>;
    /// Returns whether the property existed.
    fn remove_property(&self, id: &PropertyId) -> PropertyResult<bool>;
    fn properties_by_scene(&self, scene: &SceneId) -> PropertyResult<Vec<Property>>;
}

pub trait DatasetSchemaRepository: Send + Sync {
    fn find_dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<Option<DatasetSchema>>;
    fn save_dataset_schema(&self, schema: &DatasetSchema) -> PropertyResult<()>;
    fn remove_dataset_schema(&self, id: &DatasetSchemaId) -> PropertyResult<bool>;
    fn dataset_schemas_by_scene(&self, scene: &SceneId) -> PropertyResult<Vec<DatasetSchema>>;
}

pub trait DatasetRepository: Send + Sync {
    fn find_dataset(&self, id: &DatasetId) -> PropertyResult<Option<Dataset>>;
    fn save_datasets(&self, datasets: &[Dataset]) -> PropertyResult<()>;
    /// Records of a schema, ordered by id.
    fn datasets_by_schema(&self, schema: &DatasetSchemaId) -> PropertyResult<Vec<Dataset>>;
    /// Remove every record of a schema and return their ids.
    fn remove_datasets_by_schema(&self, schema: &DatasetSchemaId) -> PropertyResult<Vec<DatasetId>>;
}

pub trait SceneLockRepository: Send + Sync {
    /// Current lock of a scene. A scene never locked is free.
    fn get_lock(&self, scene: &SceneId) -> PropertyResult<SceneLockRecord>;
    fn save_lock(&self, scene: &SceneId, record: &SceneLockRecord) -> PropertyResult<()>;
    /// Store `next` only if the current state equals `expected`. On mismatch
    /// the inner error carries the state actually found.
    fn compare_and_swap_lock(
        &self,
        scene: &SceneId,
        expected: LockState,
        next: &SceneLockRecord,
    ) -> PropertyResult<Result<(), LockState>>;
}

/// The repositories a transaction writes through.
pub trait TransactionScope:
    PropertyRepository + DatasetSchemaRepository + DatasetRepository + DatasetSource
{
    fn as_source(&self) -> &dyn DatasetSource;
}

impl<T> TransactionScope for T
where
    T: PropertyRepository + DatasetSchemaRepository + DatasetRepository + DatasetSource,
{
    fn as_source(&self) -> &dyn DatasetSource {
        self
    }
}

/// A unit of work. Ending it without a commit rolls back every write made
/// through its [`scope`](Transaction::scope). Writes made elsewhere, including
/// other transactions, are untouched.
pub trait Transaction {
    fn scope(&self) -> &dyn TransactionScope;
    fn commit(&mut self) -> PropertyResult<()>;
    fn end(self: Box<Self>) -> PropertyResult<()>;
}

pub trait Transactor: Send + Sync {
    fn begin(&self) -> PropertyResult<Box<dyn Transaction + '_>>;
}

/// Everything the managers need from the storage layer.
pub trait Store:
    PropertyRepository
    + DatasetSchemaRepository
    + DatasetRepository
    + SceneLockRepository
    + Transactor
    + DatasetSource
{
}

impl<T> Store for T where
    T: PropertyRepository
        + DatasetSchemaRepository
        + DatasetRepository
        + SceneLockRepository
        + Transactor
        + DatasetSource
{
}
