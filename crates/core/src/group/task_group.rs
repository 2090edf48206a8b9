// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor for cancellable units of work
//!
//! Every unit spawned through a [`TaskGroup`] receives the group's shared
//! [`Context`]. Stopping the group cancels that context, waits for all units
//! and hands back every error they returned.

use super::error::{AggregateError, GroupError, TaskError};
use super::wait_group::SafeWaitGroup;
use crate::cancel::Context;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Decides whether a unit's error should stop the whole group
pub type StopPredicate = Arc<dyn Fn(&TaskError) -> bool + Send + Sync>;

/// Task group configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskGroupConfig {
    /// Cancel the group on the first failing unit
    pub stop_on_error: bool,
    /// Keep only the most recent errors; at least one is always kept
    pub max_errors: Option<usize>,
}

impl TaskGroupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_on_error(mut self, enabled: bool) -> Self {
        self.stop_on_error = enabled;
        self
    }

    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }
}

#[derive(Debug)]
struct Shared {
    wg: SafeWaitGroup,
    ctx: Context,
    errors: Mutex<VecDeque<TaskError>>,
}

impl Shared {
    fn lock_errors(&self) -> MutexGuard<'_, VecDeque<TaskError>> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stop accepting units, then signal the running ones
    fn shut_down(&self) {
        self.wg.close();
        self.ctx.cancel();
    }

    fn take_errors(&self) -> Vec<TaskError> {
        self.lock_errors().drain(..).collect()
    }
}

/// Releases the unit's slot in the wait group, even if the unit panicked
struct Finished(Arc<Shared>);

impl Drop for Finished {
    fn drop(&mut self) {
        self.0.wg.done();
    }
}

/// Spawns units of work that are torn down together
pub struct TaskGroup {
    shared: Arc<Shared>,
    stop_on_error: Option<StopPredicate>,
    max_errors: Option<usize>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }

    /// Group whose units are also cancelled when `parent` is
    pub fn with_parent(parent: &Context) -> Self {
        Self::with_context(parent.child())
    }

    pub fn with_config(config: &TaskGroupConfig) -> Self {
        let mut group = Self::new();
        if config.stop_on_error {
            group = group.stop_on_error(|_| true);
        }
        group.max_errors = config.max_errors;
        group
    }

    fn with_context(ctx: Context) -> Self {
        Self {
            shared: Arc::new(Shared {
                wg: SafeWaitGroup::new(),
                ctx,
                errors: Mutex::new(VecDeque::new()),
            }),
            stop_on_error: None,
            max_errors: None,
        }
    }

    /// Cancel the group when `predicate` matches a unit's error
    pub fn stop_on_error<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TaskError) -> bool + Send + Sync + 'static,
    {
        self.stop_on_error = Some(Arc::new(predicate));
        self
    }

    /// Keep only the `max` most recent errors; zero keeps one
    pub fn max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    /// The context shared by every unit
    pub fn context(&self) -> &Context {
        &self.shared.ctx
    }

    /// Whether the group stopped accepting units
    pub fn is_closed(&self) -> bool {
        self.shared.wg.is_closed() || self.shared.ctx.is_cancelled()
    }

    /// Spawn a unit on the tokio runtime
    ///
    /// Fails with [`GroupError::Closed`] once the group is stopping.
    pub fn go<F, Fut>(&self, task: F) -> Result<(), GroupError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        if self.shared.ctx.is_cancelled() {
            return Err(GroupError::Closed);
        }
        self.shared.wg.add(1)?;

        let finished = Finished(Arc::clone(&self.shared));
        let stop_on_error = self.stop_on_error.clone();
        let max_errors = self.max_errors;
        let ctx = self.shared.ctx.clone();

        tokio::spawn(async move {
            trace!("task started");
            let result = task(ctx).await;
            if let Err(err) = result {
                debug!(error = %err, "task failed");
                let stop = stop_on_error.as_ref().is_some_and(|pred| pred(&err));
                {
                    let mut errors = finished.0.lock_errors();
                    errors.push_back(err);
                    if let Some(max) = max_errors {
                        while errors.len() > max.max(1) {
                            errors.pop_front();
                        }
                    }
                }
                if stop {
                    debug!("stopping task group after failure");
                    finished.0.shut_down();
                }
            }
            drop(finished);
        });
        Ok(())
    }

    /// Cancel every unit, wait for all of them, and report their errors
    pub async fn stop(&self) -> Result<(), AggregateError> {
        debug!(running = self.shared.wg.count(), "stopping task group");
        self.shared.shut_down();
        self.shared.wg.wait().await;
        AggregateError::check(self.shared.take_errors())
    }

    /// Close to new units and wait for the running ones without cancelling them
    pub async fn wait(&self) -> Result<(), AggregateError> {
        self.shared.wg.wait().await;
        AggregateError::check(self.shared.take_errors())
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGroup")
            .field("running", &self.shared.wg.count())
            .field("closed", &self.is_closed())
            .field("max_errors", &self.max_errors)
            .finish()
    }
}

#[cfg(test)]
#[path = "task_group_tests.rs"]
mod tests;
