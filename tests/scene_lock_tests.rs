mod test_helpers;

use scene_property::error::PropertyError;
use scene_property::ids::SceneId;
use scene_property::repository::{SceneLockRepository, Transactor};
use scene_property::scene_lock::{LockState, SceneLockRecord, SceneLocks};
use std::sync::Arc;

#[test]
fn test_unlocked_scene_is_free() {
    let (db_ops, _) = test_helpers::setup_store();
    let locks = SceneLocks::new(Arc::clone(&db_ops));
    let scene = SceneId::new();
    assert_eq!(locks.state(&scene).unwrap(), LockState::Free);
    assert!(locks.check(&scene).is_ok());
}

#[test]
fn test_optimistic_update() {
    let (db_ops, _) = test_helpers::setup_store();
    let locks = SceneLocks::new(Arc::clone(&db_ops));
    let scene = SceneId::new();

    locks
        .update(&scene, LockState::Free, LockState::Publishing)
        .unwrap();
    match locks.update(&scene, LockState::Free, LockState::DatasetSyncing) {
        Err(PropertyError::SceneLocked { state, .. }) => assert_eq!(state, "publishing"),
        other => panic!("expected SceneLocked, got {:?}", other),
    }
    assert!(matches!(locks.check(&scene), Err(PropertyError::SceneLocked { .. })));

    locks.release(&scene).unwrap();
    assert_eq!(locks.state(&scene).unwrap(), LockState::Free);
}

#[test]
fn test_locks_are_per_scene() {
    let (db_ops, _) = test_helpers::setup_store();
    let locks = SceneLocks::new(Arc::clone(&db_ops));
    let (a, b) = (SceneId::new(), SceneId::new());
    locks.update(&a, LockState::Free, LockState::PluginUpgrading).unwrap();
    assert!(locks.check(&b).is_ok());
}

#[test]
fn test_run_locked_releases_after_success_and_failure() {
    let (db_ops, _) = test_helpers::setup_store();
    let locks = SceneLocks::new(Arc::clone(&db_ops));
    let scene = SceneId::new();

    let value = locks
        .run_locked(&scene, LockState::Publishing, |_| {
            assert_eq!(locks.state(&scene).unwrap(), LockState::Publishing);
            Ok(7)
        })
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(locks.state(&scene).unwrap(), LockState::Free);

    let failed: Result<(), _> = locks.run_locked(&scene, LockState::Publishing, |_| {
        Err(PropertyError::Config("boom".to_string()))
    });
    assert!(failed.is_err());
    assert_eq!(locks.state(&scene).unwrap(), LockState::Free);
}

#[test]
fn test_lock_survives_rollback() {
    let (db_ops, _) = test_helpers::setup_store();
    let scene = SceneId::new();
    let tx = db_ops.begin().unwrap();
    db_ops
        .save_lock(&scene, &SceneLockRecord::new(LockState::DatasetSyncing))
        .unwrap();
    tx.end().unwrap();
    assert_eq!(db_ops.get_lock(&scene).unwrap().state, LockState::DatasetSyncing);
}

#[test]
fn test_permit_verified_against_stored_lock() {
    let (db_ops, _) = test_helpers::setup_store();
    let locks = SceneLocks::new(Arc::clone(&db_ops));
    let scene = SceneId::new();
    let permit = locks.check(&scene).unwrap();

    db_ops
        .save_lock(&scene, &SceneLockRecord::new(LockState::Publishing))
        .unwrap();
    match locks.verify(&permit) {
        Err(PropertyError::SceneLocked { state, .. }) => assert_eq!(state, "publishing"),
        other => panic!("expected SceneLocked, got {:?}", other),
    }

    locks.release(&scene).unwrap();
    assert!(locks.verify(&permit).is_ok());
}
