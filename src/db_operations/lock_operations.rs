use super::core::DbOperations;
use crate::error::{PropertyError, PropertyResult};
use crate::ids::SceneId;
use crate::repository::SceneLockRepository;
use crate::scene_lock::{LockState, SceneLockRecord};

fn decode(bytes: Option<&[u8]>) -> PropertyResult<SceneLockRecord> {
    match bytes {
        Some(bytes) => Ok(serde_json::from_slice(bytes)?),
        None => Ok(SceneLockRecord::free()),
    }
}

// Lock records go straight to the tree, outside of any open transaction.
impl SceneLockRepository for DbOperations {
    fn get_lock(&self, scene: &SceneId) -> PropertyResult<SceneLockRecord> {
        let bytes = self
            .scene_locks_tree
            .get(scene.as_str())
            .map_err(|e| PropertyError::database("get_lock", e))?;
        decode(bytes.as_deref())
    }

    fn save_lock(&self, scene: &SceneId, record: &SceneLockRecord) -> PropertyResult<()> {
        let bytes = serde_json::to_vec(record)?;
        self.scene_locks_tree
            .insert(scene.as_str(), bytes)
            .map_err(|e| PropertyError::database("save_lock", e))?;
        self.scene_locks_tree
            .flush()
            .map_err(|e| PropertyError::database("flush", e))?;
        Ok(())
    }

    fn compare_and_swap_lock(
        &self,
        scene: &SceneId,
        expected: LockState,
        next: &SceneLockRecord,
    ) -> PropertyResult<Result<(), LockState>> {
        let current = self
            .scene_locks_tree
            .get(scene.as_str())
            .map_err(|e| PropertyError::database("get_lock", e))?;
        let state = decode(current.as_deref())?.state;
        if state != expected {
            return Ok(Err(state));
        }

        let swapped = self
            .scene_locks_tree
            .compare_and_swap(scene.as_str(), current.as_ref(), Some(serde_json::to_vec(next)?))
            .map_err(|e| PropertyError::database("compare_and_swap_lock", e))?;
        match swapped {
            Ok(()) => {
                self.scene_locks_tree
                    .flush()
                    .map_err(|e| PropertyError::database("flush", e))?;
                Ok(Ok(()))
            }
            Err(conflict) => Ok(Err(decode(conflict.current.as_deref())?.state)),
        }
    }
}
