// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lossy latest-value broadcast
//!
//! A [`Cell`] holds one value. Producers overwrite it with [`Cell::set`] and
//! never block; consumers observe only the most recent value. Intermediate
//! updates between two observations are lost on purpose.
//!
//! All callers parked in [`Cell::wait`] during one parking episode share a
//! single waiter. The episode is identified by a session number so a waiter
//! that gives up can tell whether `set` already retired its episode.

use crate::cancel::{cancel_reason, CancelError, Canceler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Waiter {
    fired: AtomicBool,
    notify: Notify,
}

impl Waiter {
    fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct CellState<T> {
    value: T,
    write_seq: u64,
    read_seq: u64,
    /// Present iff `waiter_count > 0`
    waiter: Option<Arc<Waiter>>,
    waiter_count: u32,
    waiter_session: u32,
    /// A waiter abandoned before firing, kept for the next episode
    idle: Option<Arc<Waiter>>,
}

impl<T> CellState<T> {
    fn observe(&mut self) {
        self.read_seq = self.write_seq;
    }

    fn park(&mut self) -> (Arc<Waiter>, u32) {
        let waiter = match &self.waiter {
            Some(waiter) => Arc::clone(waiter),
            None => {
                self.waiter_session = self.waiter_session.wrapping_add(1);
                let waiter = self
                    .idle
                    .take()
                    .filter(|w| !w.is_fired())
                    .unwrap_or_default();
                self.waiter = Some(Arc::clone(&waiter));
                waiter
            }
        };
        self.waiter_count += 1;
        (waiter, self.waiter_session)
    }

    fn unpark(&mut self, session: u32) {
        // `set` already retired this episode and reset the count
        if self.waiter.is_none() || self.waiter_session != session {
            return;
        }
        self.waiter_count -= 1;
        if self.waiter_count == 0 {
            self.idle = self.waiter.take();
        }
    }
}

/// Single-slot latest-value cell with wait/notify
#[derive(Debug)]
pub struct Cell<T> {
    state: Mutex<CellState<T>>,
}

impl<T: Clone> Cell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(CellState {
                value: initial,
                write_seq: 0,
                read_seq: 0,
                waiter: None,
                waiter_count: 0,
                waiter_session: 0,
                idle: None,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current value, marking it observed
    pub fn get(&self) -> T {
        let mut state = self.lock_state();
        state.observe();
        state.value.clone()
    }

    /// Replace the value and wake every parked waiter
    pub fn set(&self, value: T) {
        let waiter = {
            let mut state = self.lock_state();
            state.value = value;
            state.write_seq += 1;
            state.waiter_count = 0;
            state.waiter.take()
        };
        if let Some(waiter) = waiter {
            waiter.fire();
        }
    }

    /// Whether a `set` happened since the last `get`/`wait`
    pub fn has_update(&self) -> bool {
        let state = self.lock_state();
        state.read_seq != state.write_seq
    }

    /// Wait for a value not yet observed
    ///
    /// Returns at once if an update is pending; otherwise parks until the next
    /// `set` or until `cancel` fires. A `set` racing with cancellation wins.
    pub async fn wait<C>(&self, cancel: &C) -> Result<T, CancelError>
    where
        C: Canceler + ?Sized,
    {
        let (waiter, session) = {
            let mut state = self.lock_state();
            if state.read_seq != state.write_seq {
                state.observe();
                return Ok(state.value.clone());
            }
            state.park()
        };
        let mut parked = Parked {
            cell: self,
            session,
            active: true,
        };

        let notified = waiter.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !waiter.is_fired() {
            tokio::select! {
                biased;
                _ = notified.as_mut() => {}
                _ = cancel.done() => {
                    if !waiter.is_fired() {
                        return Err(cancel_reason(cancel));
                    }
                }
            }
        }

        parked.active = false;
        Ok(self.get())
    }
}

impl<T: Clone + Default> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Leaves the parking episode if a wait ends without being notified
struct Parked<'a, T> {
    cell: &'a Cell<T>,
    session: u32,
    active: bool,
}

impl<T> Drop for Parked<'_, T> {
    fn drop(&mut self) {
        if self.active {
            let mut state = self.cell.state.lock().unwrap_or_else(|e| e.into_inner());
            state.unpark(self.session);
        }
    }
}

#[cfg(test)]
#[path = "cell_tests.rs"]
mod tests;
