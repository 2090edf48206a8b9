// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! consort-core: async coordination primitives
//!
//! This crate provides:
//! - Cancellation contexts and one-shot signals
//! - A broadcast cell, a cancellable mutex and a transactional lock
//! - Keyed locks with session tracking and forced release
//! - Wait groups and task supervisors with error aggregation

pub mod cancel;
pub mod config;
pub mod coordination;
pub mod group;
pub mod signal;
pub mod sync;

// Re-exports
pub use cancel::{CancelError, Canceler, Context};
pub use config::{ConfigError, ConsortConfig};
pub use coordination::{
    LockEntry, LockManager, LockManagerConfig, LockSession, ManagedLock, SessionOutcome,
};
pub use group::{
    AggregateError, GroupError, MultiErrGroup, SafeWaitGroup, TaskError, TaskGroup,
    TaskGroupConfig,
};
pub use signal::Signal;
pub use sync::{Cell, Locker, Mutex, TxExclusive, TxLock, TxPending, TxReserved, TxShared};
