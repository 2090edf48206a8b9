// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level locking and state broadcast primitives
//!
//! This module provides:
//! - **Mutex** - Binary lock releasable by any caller, with timeout/cancellable acquisition
//! - **Cell** - Lossy latest-value broadcast between a producer and its waiters
//! - **TxLock** - Shared/Reserved/Pending/Exclusive transaction lock

pub mod cell;
pub mod mutex;
pub mod txlock;

pub use cell::Cell;
pub use mutex::Mutex;
pub use txlock::{TxExclusive, TxLock, TxPending, TxReserved, TxShared};

use async_trait::async_trait;

/// Anything that can be locked and unlocked without a guard
#[async_trait]
pub trait Locker: Send + Sync {
    async fn lock(&self);
    fn unlock(&self);
}
