// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error-collecting group of independent units

use super::error::{is_cancellation, TaskError};
use super::join::JoinCounter;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Default)]
struct Shared {
    counter: JoinCounter,
    errors: Mutex<Vec<TaskError>>,
}

/// Runs units without any shared cancellation and gathers their errors
///
/// Errors that only report [`CancelError::Canceled`](crate::cancel::CancelError)
/// are expected during shutdown and are not collected.
#[derive(Debug, Default)]
pub struct MultiErrGroup {
    shared: Arc<Shared>,
}

impl MultiErrGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a unit on the tokio runtime
    pub fn go<Fut>(&self, task: Fut)
    where
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.shared.counter.add(1);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let finished = Finished(Arc::clone(&shared));
            if let Err(err) = task.await {
                if !is_cancellation(&err) {
                    debug!(error = %err, "task failed");
                    shared
                        .errors
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(err);
                }
            }
            drop(finished);
        });
    }

    /// Wait for every spawned unit and take the errors collected so far
    pub async fn wait(&self) -> Vec<TaskError> {
        self.shared.counter.wait().await;
        std::mem::take(&mut *self.shared.errors.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

struct Finished(Arc<Shared>);

impl Drop for Finished {
    fn drop(&mut self) {
        self.0.counter.done();
    }
}
