use super::core::DbOperations;
use crate::error::{PropertyError, PropertyResult};
use crate::repository::{Transaction, TransactionScope, Transactor};

/// Transaction over a scoped [`DbOperations`] handle. Only writes made
/// through [`Transaction::scope`] are journaled. Dropping it without
/// committing rolls back.
pub struct SledTransaction {
    scope: DbOperations,
    finished: bool,
}

impl Transaction for SledTransaction {
    fn scope(&self) -> &dyn TransactionScope {
        &self.scope
    }

    fn commit(&mut self) -> PropertyResult<()> {
        if self.finished {
            return Err(PropertyError::Transaction(
                "transaction already finished".to_string(),
            ));
        }
        self.finished = true;
        self.scope.commit_journal()
    }

    fn end(mut self: Box<Self>) -> PropertyResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.scope.rollback_journal()
    }
}

impl Drop for SledTransaction {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.scope.rollback_journal() {
                crate::log_storage_error!("Rollback on drop failed: {}", e);
            }
        }
    }
}

impl Transactor for DbOperations {
    fn begin(&self) -> PropertyResult<Box<dyn Transaction + '_>> {
        if self.is_scoped() {
            return Err(PropertyError::Transaction(
                "a transaction is already open on this handle".to_string(),
            ));
        }
        Ok(Box::new(SledTransaction {
            scope: self.scoped(),
            finished: false,
        }))
    }
}
