use crate::config::StorageConfig;
use crate::constants::{DATASETS_TREE, DATASET_SCHEMAS_TREE, PROPERTIES_TREE, SCENE_LOCKS_TREE};
use crate::error::{PropertyError, PropertyResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Prior content of a key touched inside a transaction.
struct JournalEntry {
    tree: sled::Tree,
    key: Vec<u8>,
    previous: Option<sled::IVec>,
}

/// Unified access to every tree of the engine's sled database.
///
/// A handle returned by [`DbOperations::scoped`] carries its own journal:
/// writes made through it record the value they replace so that its
/// transaction can be rolled back. Writes through any other handle are not
/// affected.
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
    pub(crate) properties_tree: sled::Tree,
    pub(crate) dataset_schemas_tree: sled::Tree,
    pub(crate) datasets_tree: sled::Tree,
    /// Lock writes are never journaled: a rollback must not resurrect a lock.
    pub(crate) scene_locks_tree: sled::Tree,
    flush_on_write: bool,
    journal: Option<Arc<Mutex<Vec<JournalEntry>>>>,
}

impl DbOperations {
    /// Creates a new DbOperations instance with all required trees
    pub fn new(db: sled::Db) -> PropertyResult<Self> {
        let properties_tree = db.open_tree(PROPERTIES_TREE)?;
        let dataset_schemas_tree = db.open_tree(DATASET_SCHEMAS_TREE)?;
        let datasets_tree = db.open_tree(DATASETS_TREE)?;
        let scene_locks_tree = db.open_tree(SCENE_LOCKS_TREE)?;

        Ok(Self {
            db,
            properties_tree,
            dataset_schemas_tree,
            datasets_tree,
            scene_locks_tree,
            flush_on_write: true,
            journal: None,
        })
    }

    /// Opens the database described by the storage configuration.
    pub fn open(config: &StorageConfig) -> PropertyResult<Self> {
        let mut ops = Self::new(config.open()?)?;
        ops.flush_on_write = config.flush_on_write;
        crate::log_storage_debug!(
            "Opened property store (temporary: {}, flush_on_write: {})",
            config.temporary,
            config.flush_on_write
        );
        Ok(ops)
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Number of records per tree
    pub fn get_stats(&self) -> HashMap<&'static str, usize> {
        HashMap::from([
            (PROPERTIES_TREE, self.properties_tree.len()),
            (DATASET_SCHEMAS_TREE, self.dataset_schemas_tree.len()),
            (DATASETS_TREE, self.datasets_tree.len()),
            (SCENE_LOCKS_TREE, self.scene_locks_tree.len()),
        ])
    }

    fn journal(&self) -> PropertyResult<Option<MutexGuard<'_, Vec<JournalEntry>>>> {
        self.journal
            .as_ref()
            .map(|journal| {
                journal
                    .lock()
                    .map_err(|_| PropertyError::Transaction("transaction journal poisoned".to_string()))
            })
            .transpose()
    }

    fn flush(&self, tree: &sled::Tree) -> PropertyResult<()> {
        if self.flush_on_write {
            tree.flush()
                .map_err(|e| PropertyError::database("flush", e))?;
        }
        Ok(())
    }

    /// Write or delete a key, recording the prior value on a scoped handle.
    fn write(&self, tree: &sled::Tree, key: &str, bytes: Option<Vec<u8>>) -> PropertyResult<Option<sled::IVec>> {
        let mut journal = self.journal()?;
        let previous = match bytes {
            Some(bytes) => tree
                .insert(key.as_bytes(), bytes)
                .map_err(|e| PropertyError::database("insert", e))?,
            None => tree
                .remove(key.as_bytes())
                .map_err(|e| PropertyError::database("remove", e))?,
        };
        if let Some(entries) = journal.as_mut() {
            entries.push(JournalEntry {
                tree: tree.clone(),
                key: key.as_bytes().to_vec(),
                previous: previous.clone(),
            });
        }
        drop(journal);
        self.flush(tree)?;
        Ok(previous)
    }

    // ========== GENERIC TREE OPERATIONS ==========

    /// Store any serializable item in a specific tree
    pub fn store_in_tree<T: Serialize>(&self, tree: &sled::Tree, key: &str, item: &T) -> PropertyResult<()> {
        let bytes = serde_json::to_vec(item)?;
        self.write(tree, key, Some(bytes))?;
        Ok(())
    }

    /// Retrieve any deserializable item from a specific tree
    pub fn get_from_tree<T: DeserializeOwned>(&self, tree: &sled::Tree, key: &str) -> PropertyResult<Option<T>> {
        match tree.get(key.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(PropertyError::database("retrieve", e)),
        }
    }

    /// List all values in a tree, in key order
    pub fn list_items_in_tree<T: DeserializeOwned>(&self, tree: &sled::Tree) -> PropertyResult<Vec<T>> {
        let mut items = Vec::new();
        for result in tree.iter() {
            let (key, value) = result.map_err(|e| PropertyError::database("iterate", e))?;
            let item = serde_json::from_slice(&value).map_err(|e| {
                PropertyError::Serialization(format!(
                    "Deserialization failed for key '{}': {}",
                    String::from_utf8_lossy(&key),
                    e
                ))
            })?;
            items.push(item);
        }
        Ok(items)
    }

    /// Delete an item from a specific tree. Returns whether it existed.
    pub fn delete_from_tree(&self, tree: &sled::Tree, key: &str) -> PropertyResult<bool> {
        Ok(self.write(tree, key, None)?.is_some())
    }

    /// Check if a key exists in a specific tree
    pub fn exists_in_tree(&self, tree: &sled::Tree, key: &str) -> PropertyResult<bool> {
        tree.contains_key(key.as_bytes())
            .map_err(|e| PropertyError::database("contains", e))
    }

    // ========== JOURNAL ==========

    pub(crate) fn is_scoped(&self) -> bool {
        self.journal.is_some()
    }

    /// A handle onto the same trees with a fresh, private journal.
    pub(crate) fn scoped(&self) -> Self {
        Self {
            journal: Some(Arc::new(Mutex::new(Vec::new()))),
            ..self.clone()
        }
    }

    /// Keep every journaled write and clear the journal.
    pub(crate) fn commit_journal(&self) -> PropertyResult<()> {
        let count = self.journal()?.map(|mut entries| entries.drain(..).count()).unwrap_or(0);
        crate::log_storage_debug!("Committed transaction with {} writes", count);
        self.db
            .flush()
            .map_err(|e| PropertyError::database("flush", e))?;
        Ok(())
    }

    /// Undo every journaled write, newest first, and clear the journal.
    pub(crate) fn rollback_journal(&self) -> PropertyResult<()> {
        let entries: Vec<JournalEntry> = self
            .journal()?
            .map(|mut entries| entries.drain(..).collect())
            .unwrap_or_default();
        let count = entries.len();
        for entry in entries.into_iter().rev() {
            let restored = match entry.previous {
                Some(previous) => entry.tree.insert(entry.key, previous).map(|_| ()),
                None => entry.tree.remove(entry.key).map(|_| ()),
            };
            restored.map_err(|e| PropertyError::Transaction(format!("rollback failed: {}", e)))?;
        }
        self.db
            .flush()
            .map_err(|e| PropertyError::database("flush", e))?;
        crate::log_storage_debug!("Rolled back transaction with {} writes", count);
        Ok(())
    }
}
