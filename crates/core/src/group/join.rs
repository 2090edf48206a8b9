// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain join counter

use std::sync::MutexGuard;
use tokio::sync::Notify;

/// Counts outstanding units of work; [`JoinCounter::wait`] resolves at zero
#[derive(Debug, Default)]
pub struct JoinCounter {
    count: std::sync::Mutex<i64>,
    zero: Notify,
}

impl JoinCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_count(&self) -> MutexGuard<'_, i64> {
        self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// # Panics
    ///
    /// Panics if the counter would drop below zero.
    pub fn add(&self, delta: i64) {
        let reached_zero = {
            let mut count = self.lock_count();
            let next = *count + delta;
            assert!(next >= 0, "negative join counter");
            *count = next;
            next == 0
        };
        if reached_zero {
            self.zero.notify_waiters();
        }
    }

    pub fn done(&self) {
        self.add(-1);
    }

    pub fn count(&self) -> i64 {
        *self.lock_count()
    }

    /// Resolves once the counter is zero
    pub async fn wait(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
