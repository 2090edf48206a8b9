// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock entries and lock sessions
//!
//! A [`LockEntry`] backs one named lock: a [`Mutex`] plus the session that
//! currently holds it. A [`LockSession`] is the one-shot record of a single
//! successful acquisition.

use crate::signal::Signal;
use crate::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, MutexGuard};

/// How a lock session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The holder released the lock
    Unlocked,
    /// The lock was revoked by the manager
    Lost,
}

const ACTIVE: u8 = 0;
const UNLOCKED: u8 = 1;
const LOST: u8 = 2;

#[derive(Debug)]
struct SessionState {
    generation: u64,
    locked: AtomicBool,
    outcome: AtomicU8,
    done: Signal,
    unlocked: Signal,
    lost: Signal,
}

/// One successful acquisition of a named lock
///
/// Transitions `Locked -> {Unlocked | Lost} -> Done` exactly once. Clones
/// refer to the same session.
#[derive(Clone, Debug)]
pub struct LockSession {
    state: Arc<SessionState>,
}

impl LockSession {
    fn new(generation: u64) -> Self {
        Self {
            state: Arc::new(SessionState {
                generation,
                locked: AtomicBool::new(true),
                outcome: AtomicU8::new(ACTIVE),
                done: Signal::new(),
                unlocked: Signal::new(),
                lost: Signal::new(),
            }),
        }
    }

    /// Whether this session still owns the lock
    pub fn is_locked(&self) -> bool {
        self.state.locked.load(Ordering::Acquire)
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.state.outcome.load(Ordering::Acquire) {
            UNLOCKED => Some(SessionOutcome::Unlocked),
            LOST => Some(SessionOutcome::Lost),
            _ => None,
        }
    }

    /// Fires once the session ended, either way
    pub fn done(&self) -> Signal {
        self.state.done.clone()
    }

    /// Fires if the holder released the lock
    pub fn unlocked(&self) -> Signal {
        self.state.unlocked.clone()
    }

    /// Fires if the lock was revoked from the holder
    pub fn lock_lost(&self) -> Signal {
        self.state.lost.clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.generation
    }

    /// End the session; only the first call has any effect
    pub(crate) fn finish(&self, outcome: SessionOutcome) -> bool {
        let code = match outcome {
            SessionOutcome::Unlocked => UNLOCKED,
            SessionOutcome::Lost => LOST,
        };
        let won = self
            .state
            .outcome
            .compare_exchange(ACTIVE, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.state.locked.store(false, Ordering::Release);
            match outcome {
                SessionOutcome::Unlocked => self.state.unlocked.fire(),
                SessionOutcome::Lost => self.state.lost.fire(),
            }
            self.state.done.fire();
        }
        won
    }
}

#[derive(Debug, Default)]
struct Holder {
    /// Bumped for every session created on this entry
    generation: u64,
    current: Option<LockSession>,
    /// The current session's handle was dropped and left its table reference here
    abandoned: bool,
}

/// A session taken away by [`LockEntry::revoke`]
#[derive(Debug)]
pub(crate) struct Revoked {
    pub(crate) session: LockSession,
    /// The revoker now owns the table reference of the dropped holder
    pub(crate) abandoned: bool,
}

/// Shared record backing one named lock
///
/// The current session is present iff the mutex is held on its behalf.
#[derive(Debug)]
pub struct LockEntry {
    key: String,
    mutex: Mutex,
    holder: std::sync::Mutex<Holder>,
}

impl LockEntry {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mutex: Mutex::new(),
            holder: std::sync::Mutex::new(Holder::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    pub(crate) fn mutex(&self) -> &Mutex {
        &self.mutex
    }

    fn lock_holder(&self) -> MutexGuard<'_, Holder> {
        self.holder.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a new session; the caller must have just acquired the mutex
    pub(crate) fn begin_session(&self) -> LockSession {
        let mut holder = self.lock_holder();
        holder.generation += 1;
        let session = LockSession::new(holder.generation);
        holder.current = Some(session.clone());
        holder.abandoned = false;
        session
    }

    /// Park the table reference of a dropped handle still holding `session`
    ///
    /// Returns false if `session` is no longer current, in which case the
    /// caller keeps its reference.
    pub(crate) fn abandon(&self, session: &LockSession) -> bool {
        let mut holder = self.lock_holder();
        let current = holder
            .current
            .as_ref()
            .is_some_and(|s| s.generation() == session.generation());
        if current {
            holder.abandoned = true;
        }
        current
    }

    /// Release on behalf of `session`
    ///
    /// The mutex is only released if `session` is still the current one; a
    /// session already revoked by [`LockEntry::revoke`] is left alone.
    pub(crate) fn unlock(&self, session: &LockSession) {
        {
            let mut holder = self.lock_holder();
            let current = holder
                .current
                .as_ref()
                .is_some_and(|s| s.generation() == session.generation());
            if current {
                holder.current = None;
                self.mutex.unlock();
            }
        }
        session.finish(SessionOutcome::Unlocked);
    }

    /// Revoke the current session, if any, and release the mutex
    ///
    /// Also reports whether the holder's table reference was parked here.
    pub(crate) fn revoke(&self) -> Option<Revoked> {
        let revoked = {
            let mut holder = self.lock_holder();
            let session = holder.current.take()?;
            self.mutex.unlock();
            Revoked {
                session,
                abandoned: std::mem::take(&mut holder.abandoned),
            }
        };
        revoked.session.finish(SessionOutcome::Lost);
        Some(revoked)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
