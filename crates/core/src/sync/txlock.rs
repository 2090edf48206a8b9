// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Four-level transaction lock
//!
//! Readers take **Shared**. A writer takes **Reserved** to exclude other
//! writers while readers keep running, **Pending** to stop new readers from
//! starting, then **Exclusive** to wait for in-flight readers to drain before
//! committing. Releasing Pending and Reserved ends the write.
//!
//! ```text
//! writer:  Reserved ── Pending ── Exclusive ── commit ── unlock Pending ── unlock Reserved
//! reader:  Shared (blocked only between Pending and its unlock)
//! ```

use super::{Locker, Mutex};
use async_trait::async_trait;
use std::sync::MutexGuard;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TxState {
    shared: u32,
    pending: bool,
}

/// Shared/Reserved/Pending/Exclusive lock over one transaction state
#[derive(Debug)]
pub struct TxLock {
    reserved: Mutex,
    state: std::sync::Mutex<TxState>,
    /// Woken when Pending is released
    shared_available: Notify,
    /// Woken when the last Shared holder leaves
    exclusive_available: Notify,
}

impl TxLock {
    pub fn new() -> Self {
        Self {
            reserved: Mutex::new(),
            state: std::sync::Mutex::new(TxState::default()),
            shared_available: Notify::new(),
            exclusive_available: Notify::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn shared(&self) -> TxShared<'_> {
        TxShared { tx: self }
    }

    pub fn reserved(&self) -> TxReserved<'_> {
        TxReserved { tx: self }
    }

    pub fn pending(&self) -> TxPending<'_> {
        TxPending { tx: self }
    }

    pub fn exclusive(&self) -> TxExclusive<'_> {
        TxExclusive { tx: self }
    }

    /// Lock level a transaction starts with: Shared for readers, Reserved for writers
    pub fn tx_lock(&self, readonly: bool) -> Box<dyn Locker + '_> {
        if readonly {
            Box::new(self.shared())
        } else {
            Box::new(self.reserved())
        }
    }

    /// Number of Shared holders
    pub fn shared_count(&self) -> u32 {
        self.lock_state().shared
    }

    pub fn is_pending(&self) -> bool {
        self.lock_state().pending
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved.is_locked()
    }
}

impl Default for TxLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader access; blocked only while Pending is held
#[derive(Clone, Copy, Debug)]
pub struct TxShared<'a> {
    tx: &'a TxLock,
}

impl TxShared<'_> {
    pub async fn lock(&self) {
        loop {
            let notified = self.tx.shared_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.tx.lock_state();
                if !state.pending {
                    state.shared += 1;
                    return;
                }
            }
            notified.await;
        }
    }

    /// # Panics
    ///
    /// Panics if no Shared lock is held.
    pub fn unlock(&self) {
        let drained = {
            let mut state = self.tx.lock_state();
            assert!(state.shared > 0, "unlock of unheld shared lock");
            state.shared -= 1;
            state.shared == 0
        };
        if drained {
            self.tx.exclusive_available.notify_waiters();
        }
    }
}

/// Writer-vs-writer exclusion; does not interact with readers
#[derive(Clone, Copy, Debug)]
pub struct TxReserved<'a> {
    tx: &'a TxLock,
}

impl TxReserved<'_> {
    pub async fn lock(&self) {
        self.tx.reserved.lock().await
    }

    pub fn unlock(&self) {
        self.tx.reserved.unlock()
    }
}

/// Announces a commit: no new readers may start
#[derive(Clone, Copy, Debug)]
pub struct TxPending<'a> {
    tx: &'a TxLock,
}

impl TxPending<'_> {
    /// # Panics
    ///
    /// Panics unless Reserved is held.
    pub async fn lock(&self) {
        assert!(
            self.tx.reserved.is_locked(),
            "pending lock requires the reserved lock"
        );
        self.tx.lock_state().pending = true;
    }

    pub fn unlock(&self) {
        self.tx.lock_state().pending = false;
        self.tx.shared_available.notify_waiters();
    }
}

/// Full isolation: waits until every Shared holder has left
#[derive(Clone, Copy, Debug)]
pub struct TxExclusive<'a> {
    tx: &'a TxLock,
}

impl TxExclusive<'_> {
    /// # Panics
    ///
    /// Panics unless Pending is held.
    pub async fn lock(&self) {
        assert!(
            self.tx.is_pending(),
            "exclusive lock requires the pending lock"
        );
        loop {
            let notified = self.tx.exclusive_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.tx.shared_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// No-op; the writer gives up isolation by unlocking Pending and Reserved
    pub fn unlock(&self) {}
}

#[async_trait]
impl<'a> Locker for TxShared<'a> {
    async fn lock(&self) {
        TxShared::lock(self).await
    }

    fn unlock(&self) {
        TxShared::unlock(self)
    }
}

#[async_trait]
impl<'a> Locker for TxReserved<'a> {
    async fn lock(&self) {
        TxReserved::lock(self).await
    }

    fn unlock(&self) {
        TxReserved::unlock(self)
    }
}

#[async_trait]
impl<'a> Locker for TxPending<'a> {
    async fn lock(&self) {
        TxPending::lock(self).await
    }

    fn unlock(&self) {
        TxPending::unlock(self)
    }
}

#[async_trait]
impl<'a> Locker for TxExclusive<'a> {
    async fn lock(&self) {
        TxExclusive::lock(self).await
    }

    fn unlock(&self) {
        TxExclusive::unlock(self)
    }
}

#[cfg(test)]
#[path = "txlock_tests.rs"]
mod tests;
