// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured concurrency supervisors
//!
//! This module provides:
//! - **SafeWaitGroup** - Join counter that rejects new work once closed
//! - **TaskGroup** - Spawns cancellable units sharing one context, stops them together
//! - **MultiErrGroup** - Spawns independent units and collects their errors

pub mod error;
pub mod join;
pub mod multi_err;
pub mod task_group;
pub mod wait_group;

pub use error::{AggregateError, GroupError, TaskError};
pub use join::JoinCounter;
pub use multi_err::MultiErrGroup;
pub use task_group::{TaskGroup, TaskGroupConfig};
pub use wait_group::SafeWaitGroup;
