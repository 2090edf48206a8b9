// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of named, revocable locks
//!
//! Entries are created on the first lock attempt for a key and removed as
//! soon as no [`ManagedLock`] handle is attached, so memory follows the set
//! of keys currently in use. The table lock is only held for table
//! bookkeeping, never while waiting on a named lock.

use super::lock::{LockEntry, LockSession};
use crate::cancel::{CancelError, Canceler};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Lock manager configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockManagerConfig {
    /// Release locks whose handle is dropped while still held
    ///
    /// Advisory only. Callers still own the `unlock`.
    pub auto_release: bool,
}

impl LockManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_release(mut self, enabled: bool) -> Self {
        self.auto_release = enabled;
        self
    }
}

#[derive(Debug)]
struct TableSlot {
    entry: Arc<LockEntry>,
    /// Attached handles plus in-flight manager operations
    refs: usize,
}

#[derive(Debug, Default)]
struct ManagerInner {
    table: std::sync::Mutex<HashMap<String, TableSlot>>,
    config: LockManagerConfig,
}

/// Manages named locks; clones share the same table
#[derive(Clone, Debug, Default)]
pub struct LockManager {
    inner: Arc<ManagerInner>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LockManagerConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                table: std::sync::Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &LockManagerConfig {
        &self.inner.config
    }

    /// A fresh handle for `key`; the table is not touched until it locks
    pub fn access(&self, key: impl Into<String>) -> ManagedLock {
        ManagedLock {
            key: key.into(),
            manager: self.clone(),
            entry: None,
            session: None,
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<String, TableSlot>> {
        self.inner.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take a reference on the entry for `key`, if there is one
    fn retain(&self, key: &str) -> Option<Arc<LockEntry>> {
        let mut table = self.lock_table();
        let slot = table.get_mut(key)?;
        slot.refs += 1;
        Some(Arc::clone(&slot.entry))
    }

    /// Take a reference on the entry for `key`, creating it on first use
    fn retain_or_insert(&self, key: &str) -> Arc<LockEntry> {
        let mut table = self.lock_table();
        let slot = table.entry(key.to_string()).or_insert_with(|| TableSlot {
            entry: Arc::new(LockEntry::new(key)),
            refs: 0,
        });
        slot.refs += 1;
        Arc::clone(&slot.entry)
    }

    /// Drop a reference; the entry leaves the table with its last reference
    fn release(&self, entry: &LockEntry) {
        let mut table = self.lock_table();
        let Some(slot) = table.get_mut(entry.key()) else {
            return;
        };
        slot.refs = slot.refs.saturating_sub(1);
        if slot.refs == 0 {
            table.remove(entry.key());
        }
    }

    /// Revoke the lock on `key` from its holder
    ///
    /// The holder's session fires `lock_lost`. Returns whether a session was
    /// revoked.
    pub fn force_unlock(&self, key: &str) -> bool {
        let Some(entry) = self.retain(key) else {
            return false;
        };
        let revoked = self.revoke(&entry);
        self.release(&entry);
        revoked
    }

    /// Revoke `entry`'s session, dropping the reference of an abandoned holder
    fn revoke(&self, entry: &LockEntry) -> bool {
        let Some(revoked) = entry.revoke() else {
            return false;
        };
        debug!(key = entry.key(), abandoned = revoked.abandoned, "lock revoked");
        if revoked.abandoned {
            self.release(entry);
        }
        true
    }

    /// Revoke every lock currently in the table; returns how many were revoked
    pub fn force_unlock_all(&self) -> usize {
        let entries: Vec<Arc<LockEntry>> = {
            let mut table = self.lock_table();
            table
                .values_mut()
                .map(|slot| {
                    slot.refs += 1;
                    Arc::clone(&slot.entry)
                })
                .collect()
        };

        let mut revoked = 0;
        for entry in &entries {
            if self.revoke(entry) {
                revoked += 1;
            }
            self.release(entry);
        }
        revoked
    }

    /// Number of keys with an entry in the table
    pub fn len(&self) -> usize {
        self.lock_table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_table().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock_table().contains_key(key)
    }

    /// Whether `key` is currently held
    pub fn is_locked(&self, key: &str) -> bool {
        self.lock_table()
            .get(key)
            .is_some_and(|slot| slot.entry.is_locked())
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock_table().keys().cloned().collect()
    }
}

/// Handle used by one owner to lock a named lock
///
/// Not meant to be shared: two owners needing the same key each take their
/// own handle from [`LockManager::access`].
#[derive(Debug)]
pub struct ManagedLock {
    key: String,
    manager: LockManager,
    entry: Option<Arc<LockEntry>>,
    session: Option<LockSession>,
}

impl ManagedLock {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The session of the last successful acquisition, if not yet unlocked
    pub fn session(&self) -> Option<&LockSession> {
        self.session.as_ref()
    }

    /// Whether this handle currently owns the lock
    pub fn is_locked(&self) -> bool {
        self.session.as_ref().is_some_and(LockSession::is_locked)
    }

    pub fn done(&self) -> Signal {
        self.session
            .as_ref()
            .map_or_else(Signal::fired, LockSession::done)
    }

    pub fn unlocked(&self) -> Signal {
        self.session
            .as_ref()
            .map_or_else(Signal::fired, LockSession::unlocked)
    }

    pub fn lock_lost(&self) -> Signal {
        self.session
            .as_ref()
            .map_or_else(Signal::fired, LockSession::lock_lost)
    }

    /// Wait until the lock is acquired
    ///
    /// # Panics
    ///
    /// Panics if this handle already holds the lock.
    pub async fn lock(&mut self) -> LockSession {
        let attempt = self.attach();
        attempt.entry().mutex().lock().await;
        self.begin(attempt)
    }

    /// Acquire the lock if it is free, without waiting
    pub fn try_lock(&mut self) -> Option<LockSession> {
        let attempt = self.attach();
        if attempt.entry().mutex().try_lock() {
            Some(self.begin(attempt))
        } else {
            None
        }
    }

    /// Wait up to `timeout` for the lock
    ///
    /// A zero timeout only tries once; `Duration::MAX` waits forever.
    pub async fn lock_timeout(&mut self, timeout: Duration) -> Option<LockSession> {
        let attempt = self.attach();
        if attempt.entry().mutex().lock_timeout(timeout).await {
            Some(self.begin(attempt))
        } else {
            None
        }
    }

    /// Wait for the lock until `cancel` fires
    pub async fn lock_with_cancellation<C>(&mut self, cancel: &C) -> Result<LockSession, CancelError>
    where
        C: Canceler + ?Sized,
    {
        let attempt = self.attach();
        attempt.entry().mutex().lock_with_cancellation(cancel).await?;
        Ok(self.begin(attempt))
    }

    /// Release the lock and detach from the table
    ///
    /// Safe to call after the lock was revoked: the revoked session is not
    /// signalled again and the key is not released a second time.
    ///
    /// # Panics
    ///
    /// Panics if this handle has no session.
    pub fn unlock(&mut self) {
        assert!(
            self.session.is_some(),
            "unlock of managed lock {:?} without an active session",
            self.key
        );
        if let (Some(session), Some(entry)) = (self.session.take(), &self.entry) {
            entry.unlock(&session);
        }
        self.detach();
    }

    fn attach(&mut self) -> Attempt {
        assert!(
            !self.is_locked(),
            "managed lock {:?} is already locked by this handle",
            self.key
        );
        // A revoked session may still be attached
        self.session = None;
        self.detach();

        Attempt {
            entry: self.manager.retain_or_insert(&self.key),
            manager: self.manager.clone(),
            armed: true,
        }
    }

    fn begin(&mut self, attempt: Attempt) -> LockSession {
        let entry = attempt.complete();
        let session = entry.begin_session();
        self.entry = Some(entry);
        self.session = Some(session.clone());
        session
    }

    fn detach(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.manager.release(&entry);
        }
    }
}

impl Drop for ManagedLock {
    fn drop(&mut self) {
        if !self.is_locked() {
            self.detach();
            return;
        }
        if self.manager.config().auto_release {
            warn!(key = %self.key, "managed lock dropped while held, releasing");
            self.unlock();
            return;
        }
        let parked = match (&self.entry, &self.session) {
            (Some(entry), Some(session)) => entry.abandon(session),
            _ => false,
        };
        if parked {
            // The entry keeps our reference until the session is revoked
            warn!(key = %self.key, "managed lock dropped while held, key stays locked");
            self.entry = None;
        } else {
            self.detach();
        }
    }
}

/// Table reference taken for one acquisition attempt
///
/// Released on drop unless the attempt succeeded, so a cancelled or dropped
/// acquisition leaves no reference behind.
struct Attempt {
    manager: LockManager,
    entry: Arc<LockEntry>,
    armed: bool,
}

impl Attempt {
    fn entry(&self) -> &LockEntry {
        &self.entry
    }

    /// Hand the reference over to the handle
    fn complete(mut self) -> Arc<LockEntry> {
        self.armed = false;
        Arc::clone(&self.entry)
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        if self.armed {
            self.manager.release(&self.entry);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
