// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wait group that refuses work after shutdown started

use super::error::GroupError;
use super::join::JoinCounter;
use std::sync::RwLock;

/// Join counter with a closed state
///
/// Once closed, positive `add` calls fail with [`GroupError::Closed`] while
/// completions keep being accepted. Closing and waiting are separate steps so
/// a unit spawning a child during shutdown gets an error instead of racing
/// the final wait.
#[derive(Debug, Default)]
pub struct SafeWaitGroup {
    counter: JoinCounter,
    /// Held shared by `add`, exclusively by `close`
    closed: RwLock<bool>,
}

impl SafeWaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` units, or complete `-n` units when negative
    pub fn add(&self, n: i64) -> Result<(), GroupError> {
        if n < 0 {
            self.counter.add(n);
            return Ok(());
        }
        let closed = self.closed.read().unwrap_or_else(|e| e.into_inner());
        if *closed {
            return Err(GroupError::Closed);
        }
        self.counter.add(n);
        Ok(())
    }

    /// Mark one unit finished
    pub fn done(&self) {
        self.counter.done();
    }

    /// Stop accepting new units. Idempotent, never waits for running units.
    pub fn close(&self) {
        *self.closed.write().unwrap_or_else(|e| e.into_inner()) = true;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of registered units not yet finished
    pub fn count(&self) -> i64 {
        self.counter.count()
    }

    /// Close, then wait for every registered unit to finish
    pub async fn wait(&self) {
        self.close();
        self.counter.wait().await;
    }
}

#[cfg(test)]
#[path = "wait_group_tests.rs"]
mod tests;
