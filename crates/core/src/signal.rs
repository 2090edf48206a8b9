// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot broadcast events

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// A one-shot event any number of listeners can await
///
/// Once fired a signal stays fired. Clones observe the same event.
#[derive(Clone, Debug, Default)]
pub struct Signal {
    token: CancellationToken,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that has already fired
    pub fn fired() -> Self {
        let signal = Self::new();
        signal.fire();
        signal
    }

    /// Fire the signal, waking all listeners. Idempotent.
    pub fn fire(&self) {
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Like [`Signal::wait`], but not tied to the lifetime of `self`
    pub fn wait_owned(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }
}
