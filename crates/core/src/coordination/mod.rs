// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named, revocable locks
//!
//! This module provides:
//! - **LockManager** - Table of named locks, created on demand and dropped when unused
//! - **ManagedLock** - Per-owner handle for locking one key
//! - **LockSession** - One acquisition, signalling whether it was released or revoked

pub mod lock;
pub mod manager;

pub use lock::{LockEntry, LockSession, SessionOutcome};
pub use manager::{LockManager, LockManagerConfig, ManagedLock};
