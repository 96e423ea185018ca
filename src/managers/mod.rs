//! Usecase orchestration on top of the engine: every mutation runs under a
//! scene permit and inside one transaction.

pub mod dataset_manager;
pub mod property_manager;

pub use dataset_manager::DatasetManager;
pub use property_manager::PropertyManager;

use crate::error::PropertyResult;
use crate::repository::{TransactionScope, Transactor};

/// Run `f` in a transaction, committing on success and rolling back on error.
/// Writes must go through the scope handed to `f`.
pub(crate) fn in_transaction<S, T>(
    store: &S,
    f: impl FnOnce(&dyn TransactionScope) -> PropertyResult<T>,
) -> PropertyResult<T>
where
    S: Transactor + ?Sized,
{
    let mut tx = store.begin()?;
    let result = f(tx.scope());
    match result {
        Ok(value) => {
            tx.commit()?;
            tx.end()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.end() {
                crate::log_storage_error!("Rollback after '{}' failed: {}", e, rollback);
            }
            Err(e)
        }
    }
}
