//! Managed locks: forced release and session signals

use crate::prelude::*;

#[tokio::test]
async fn force_unlock_signals_lost_once() {
    let manager = LockManager::new();
    let mut holder = manager.access("job");
    let session = holder.lock().await;

    assert!(manager.force_unlock("job"));
    within("lost", session.lock_lost().wait()).await;
    within("done", session.done().wait()).await;
    assert_eq!(session.outcome(), Some(SessionOutcome::Lost));
    assert!(!session.unlocked().is_fired());

    // A late unlock from the old holder changes nothing
    holder.unlock();
    assert_eq!(session.outcome(), Some(SessionOutcome::Lost));
    assert!(!session.unlocked().is_fired());
    assert!(manager.is_empty());
}

#[tokio::test]
async fn stale_unlock_does_not_release_new_holder() {
    let manager = LockManager::new();
    let mut first = manager.access("job");
    let mut second = manager.access("job");

    first.lock().await;
    manager.force_unlock("job");
    let current = within("second holder", second.lock()).await;

    first.unlock();
    assert!(current.is_locked());
    assert!(manager.is_locked("job"));

    second.unlock();
    assert_eq!(current.outcome(), Some(SessionOutcome::Unlocked));
    assert!(manager.is_empty());
}

#[tokio::test]
async fn force_unlock_all_revokes_every_holder() {
    let manager = LockManager::new();
    let mut handles: Vec<_> = ["a", "b", "c"].iter().map(|k| manager.access(*k)).collect();
    let mut sessions = Vec::new();
    for handle in &mut handles {
        sessions.push(handle.lock().await);
    }

    assert_eq!(manager.force_unlock_all(), 3);
    for session in &sessions {
        assert_eq!(session.outcome(), Some(SessionOutcome::Lost));
    }
    for handle in &mut handles {
        handle.unlock();
    }
    assert!(manager.is_empty());
}

#[tokio::test]
async fn dropped_holder_is_released_when_configured() {
    let manager = LockManager::with_config(LockManagerConfig::new().with_auto_release(true));
    let session = {
        let mut lock = manager.access("job");
        lock.lock().await
    };

    assert_eq!(session.outcome(), Some(SessionOutcome::Unlocked));
    let mut next = manager.access("job");
    assert!(next.try_lock().is_some());
    next.unlock();
    assert!(manager.is_empty());
}

#[tokio::test]
async fn revoking_a_dropped_holder_frees_the_key() {
    let manager = LockManager::new();
    let session = {
        let mut lock = manager.access("job");
        lock.lock().await
    };
    assert!(manager.is_locked("job"));

    assert!(manager.force_unlock("job"));
    assert_eq!(session.outcome(), Some(SessionOutcome::Lost));
    assert!(manager.is_empty());
}
