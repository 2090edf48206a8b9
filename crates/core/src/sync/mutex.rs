// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative binary mutex
//!
//! The lock is not tied to a guard, so it can be released on behalf of its
//! holder (see the named locks in `coordination`). `Mutex::default()` is an
//! inert lock that can never be acquired.

use super::Locker;
use crate::cancel::{cancel_reason, CancelError, Canceler};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug)]
struct Slot {
    permit: Semaphore,
    locked: AtomicBool,
}

impl Slot {
    async fn acquire(&self) {
        match self.permit.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.locked.store(true, Ordering::Release);
            }
            // The semaphore is never closed
            Err(_) => std::future::pending().await,
        }
    }

    fn try_acquire(&self) -> bool {
        match self.permit.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.locked.store(true, Ordering::Release);
                true
            }
            Err(_) => false,
        }
    }
}

/// Binary lock with blocking, timeout, cancellable and pollable acquisition
#[derive(Debug, Default)]
pub struct Mutex {
    slot: Option<Slot>,
}

impl Mutex {
    pub fn new() -> Self {
        Self {
            slot: Some(Slot {
                permit: Semaphore::new(1),
                locked: AtomicBool::new(false),
            }),
        }
    }

    /// Wait until the lock is acquired
    pub async fn lock(&self) {
        match &self.slot {
            Some(slot) => slot.acquire().await,
            None => std::future::pending().await,
        }
    }

    /// Acquire the lock if it is free, without waiting
    pub fn try_lock(&self) -> bool {
        self.slot.as_ref().is_some_and(Slot::try_acquire)
    }

    /// Wait up to `timeout` for the lock
    ///
    /// A zero timeout only tries once; `Duration::MAX` waits forever.
    pub async fn lock_timeout(&self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return self.try_lock();
        }
        if timeout == Duration::MAX {
            self.lock().await;
            return true;
        }
        tokio::time::timeout(timeout, self.lock()).await.is_ok()
    }

    /// Wait for the lock until `cancel` fires
    ///
    /// An already-cancelled source fails without touching the lock. When the
    /// lock becomes free at the same moment as cancellation, acquisition wins.
    pub async fn lock_with_cancellation<C>(&self, cancel: &C) -> Result<(), CancelError>
    where
        C: Canceler + ?Sized,
    {
        if let Some(err) = cancel.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            _ = self.lock() => Ok(()),
            _ = cancel.done() => Err(cancel_reason(cancel)),
        }
    }

    /// The acquisition as a standalone event, for use as a `select!` branch
    ///
    /// Nothing is acquired until the returned future completes; dropping it
    /// early (because another branch won) leaves the lock untouched.
    pub fn acquirable(&self) -> impl Future<Output = ()> + Send + '_ {
        self.lock()
    }

    /// Release the lock
    ///
    /// # Panics
    ///
    /// Panics if the lock is not held.
    pub fn unlock(&self) {
        let held = self
            .slot
            .as_ref()
            .is_some_and(|slot| slot.locked.swap(false, Ordering::AcqRel));
        assert!(held, "unlock of unlocked mutex");
        if let Some(slot) = &self.slot {
            slot.permit.add_permits(1);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|slot| slot.locked.load(Ordering::Acquire))
    }
}

#[async_trait]
impl Locker for Mutex {
    async fn lock(&self) {
        Mutex::lock(self).await
    }

    fn unlock(&self) {
        Mutex::unlock(self)
    }
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
