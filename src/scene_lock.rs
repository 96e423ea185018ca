//! Per-scene advisory lock guarding structural mutation against long-running
//! jobs such as dataset sync and publishing.
//!
//! Mutations require a [`ScenePermit`], which can only be obtained from
//! [`SceneLocks`]. A permit records the state it was issued under and is
//! re-verified against the stored lock before every write, so a permit taken
//! while the scene was free stops working once a job locks the scene.

use crate::error::{PropertyError, PropertyResult};
use crate::ids::SceneId;
use crate::repository::SceneLockRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Free,
    DatasetSyncing,
    Publishing,
    PluginUpgrading,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockState::Free => "free",
            LockState::DatasetSyncing => "dataset_syncing",
            LockState::Publishing => "publishing",
            LockState::PluginUpgrading => "plugin_upgrading",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLockRecord {
    pub state: LockState,
    pub updated_at: DateTime<Utc>,
}

impl SceneLockRecord {
    pub fn new(state: LockState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
        }
    }

    pub fn free() -> Self {
        Self::new(LockState::Free)
    }
}

/// Capability to mutate the properties of one scene.
#[derive(Debug)]
pub struct ScenePermit {
    scene: SceneId,
    held: LockState,
}

impl ScenePermit {
    pub fn scene(&self) -> &SceneId {
        &self.scene
    }

    /// The lock state the holder observed or acquired.
    pub fn held(&self) -> LockState {
        self.held
    }

    /// Fail unless the permit was issued for `scene`.
    pub fn covers(&self, scene: &SceneId) -> PropertyResult<()> {
        if &self.scene != scene {
            return Err(PropertyError::SceneLocked {
                scene: scene.to_string(),
                state: format!("permit issued for scene {}", self.scene),
            });
        }
        Ok(())
    }
}

pub struct SceneLocks<R: SceneLockRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: SceneLockRepository + ?Sized> Clone for SceneLocks<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: SceneLockRepository + ?Sized> SceneLocks<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn state(&self, scene: &SceneId) -> PropertyResult<LockState> {
        Ok(self.repository.get_lock(scene)?.state)
    }

    /// Permit for a plain mutation. Fails with `SceneLocked` unless the scene is free.
    pub fn check(&self, scene: &SceneId) -> PropertyResult<ScenePermit> {
        let state = self.state(scene)?;
        if state != LockState::Free {
            crate::log_lock_warn!("Scene {} is locked ({})", scene, state);
            return Err(PropertyError::SceneLocked {
                scene: scene.to_string(),
                state: state.to_string(),
            });
        }
        Ok(ScenePermit {
            scene: scene.clone(),
            held: LockState::Free,
        })
    }

    /// Fail with `SceneLocked` unless the scene is still in the state the
    /// permit was issued under.
    pub fn verify(&self, permit: &ScenePermit) -> PropertyResult<()> {
        let state = self.state(&permit.scene)?;
        if state != permit.held {
            crate::log_lock_warn!(
                "Permit for scene {} was issued under {}, scene is now {}",
                permit.scene,
                permit.held,
                state
            );
            return Err(PropertyError::SceneLocked {
                scene: permit.scene.to_string(),
                state: state.to_string(),
            });
        }
        Ok(())
    }

    /// Move the lock from `from` to `to`. Fails with `SceneLocked` when the
    /// current state is not `from`.
    pub fn update(&self, scene: &SceneId, from: LockState, to: LockState) -> PropertyResult<ScenePermit> {
        match self
            .repository
            .compare_and_swap_lock(scene, from, &SceneLockRecord::new(to))?
        {
            Ok(()) => {
                crate::log_lock_info!("Scene {} lock {} -> {}", scene, from, to);
                Ok(ScenePermit {
                    scene: scene.clone(),
                    held: to,
                })
            }
            Err(current) => {
                crate::log_lock_warn!(
                    "Scene {} lock conflict: expected {}, found {}",
                    scene,
                    from,
                    current
                );
                Err(PropertyError::SceneLocked {
                    scene: scene.to_string(),
                    state: current.to_string(),
                })
            }
        }
    }

    /// Unconditionally free the scene.
    pub fn release(&self, scene: &SceneId) -> PropertyResult<()> {
        self.repository.save_lock(scene, &SceneLockRecord::free())?;
        crate::log_lock_info!("Scene {} lock released", scene);
        Ok(())
    }

    /// Acquire `state`, run `f`, and release the lock whether or not `f` failed.
    pub fn run_locked<T>(
        &self,
        scene: &SceneId,
        state: LockState,
        f: impl FnOnce(&ScenePermit) -> PropertyResult<T>,
    ) -> PropertyResult<T> {
        let permit = self.update(scene, LockState::Free, state)?;
        let result = f(&permit);
        let released = self.release(scene);
        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(release_error) = released {
                    crate::log_lock_warn!("Failed to release scene {}: {}", scene, release_error);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryLocks {
        locks: Mutex<HashMap<SceneId, SceneLockRecord>>,
    }

    impl SceneLockRepository for MemoryLocks {
        fn get_lock(&self, scene: &SceneId) -> PropertyResult<SceneLockRecord> {
            let locks = self.locks.lock().unwrap();
            Ok(locks.get(scene).cloned().unwrap_or_else(SceneLockRecord::free))
        }

        fn save_lock(&self, scene: &SceneId, record: &SceneLockRecord) -> PropertyResult<()> {
            self.locks.lock().unwrap().insert(scene.clone(), record.clone());
            Ok(())
        }

        fn compare_and_swap_lock(
            &self,
            scene: &SceneId,
            expected: LockState,
            next: &SceneLockRecord,
        ) -> PropertyResult<Result<(), LockState>> {
            let mut locks = self.locks.lock().unwrap();
            let current = locks.get(scene).map(|r| r.state).unwrap_or_default();
            if current != expected {
                return Ok(Err(current));
            }
            locks.insert(scene.clone(), next.clone());
            Ok(Ok(()))
        }
    }

    fn locks() -> SceneLocks<MemoryLocks> {
        SceneLocks::new(Arc::new(MemoryLocks::default()))
    }

    #[test]
    fn test_check_and_update() {
        let locks = locks();
        let scene = SceneId::new();
        assert_eq!(locks.check(&scene).unwrap().held(), LockState::Free);

        let permit = locks
            .update(&scene, LockState::Free, LockState::Publishing)
            .unwrap();
        assert_eq!(permit.held(), LockState::Publishing);
        assert!(matches!(locks.check(&scene), Err(PropertyError::SceneLocked { .. })));
        assert!(matches!(
            locks.update(&scene, LockState::Free, LockState::DatasetSyncing),
            Err(PropertyError::SceneLocked { .. })
        ));

        locks.release(&scene).unwrap();
        assert!(locks.check(&scene).is_ok());
    }

    #[test]
    fn test_run_locked_releases_on_error() {
        let locks = locks();
        let scene = SceneId::new();
        let result: PropertyResult<()> = locks.run_locked(&scene, LockState::DatasetSyncing, |permit| {
            assert_eq!(permit.held(), LockState::DatasetSyncing);
            Err(PropertyError::cancelled("sync"))
        });
        assert!(matches!(result, Err(PropertyError::Cancelled { .. })));
        assert_eq!(locks.state(&scene).unwrap(), LockState::Free);
    }

    #[test]
    fn test_verify_rejects_stale_permit() {
        let locks = locks();
        let scene = SceneId::new();
        let permit = locks.check(&scene).unwrap();
        assert!(locks.verify(&permit).is_ok());

        let syncing = locks
            .update(&scene, LockState::Free, LockState::DatasetSyncing)
            .unwrap();
        assert!(matches!(
            locks.verify(&permit),
            Err(PropertyError::SceneLocked { state, .. }) if state == "dataset_syncing"
        ));
        assert!(locks.verify(&syncing).is_ok());

        locks.release(&scene).unwrap();
        assert!(locks.verify(&permit).is_ok());
        assert!(locks.verify(&syncing).is_err());
    }

    #[test]
    fn test_permit_covers_only_its_scene() {
        let locks = locks();
        let scene = SceneId::new();
        let permit = locks.check(&scene).unwrap();
        assert!(permit.covers(&scene).is_ok());
        assert!(permit.covers(&SceneId::new()).is_err());
    }

    #[test]
    fn test_lock_state_serialization() {
        assert_eq!(
            serde_json::to_string(&LockState::DatasetSyncing).unwrap(),
            "\"dataset_syncing\""
        );
    }
}
