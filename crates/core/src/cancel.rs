// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation contexts
//!
//! Every blocking primitive in this crate accepts anything implementing
//! [`Canceler`]: a "done" event plus the reason it fired. [`Context`] is the
//! stock implementation, a tree of cancellation tokens with optional
//! deadlines.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reason a cancellation source fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A source of cooperative cancellation
#[async_trait]
pub trait Canceler: Send + Sync {
    /// Resolves once the source has been cancelled
    async fn done(&self);

    /// The cancellation reason, or `None` while still live
    fn err(&self) -> Option<CancelError>;
}

/// Reason to report after `done` resolved
pub(crate) fn cancel_reason<C: Canceler + ?Sized>(cancel: &C) -> CancelError {
    cancel.err().unwrap_or(CancelError::Canceled)
}

/// Hierarchical cancellation context with optional deadline
///
/// Cloning yields another handle to the same context. Children derived with
/// [`Context::child`] are cancelled together with their parent, never the
/// other way round.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    token: CancellationToken,
    deadline: Option<Instant>,
    /// First recorded reason wins
    reason: OnceLock<CancelError>,
    parent: Option<Context>,
}

impl Context {
    /// Root context, cancelled only by an explicit [`Context::cancel`]
    pub fn new() -> Self {
        Self::build(CancellationToken::new(), None, None)
    }

    /// Root context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(timeout))
    }

    /// Root context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(CancellationToken::new(), Some(deadline), None)
    }

    /// Derive a child that inherits this context's deadline
    pub fn child(&self) -> Self {
        Self::build(
            self.inner.token.child_token(),
            self.inner.deadline,
            Some(self.clone()),
        )
    }

    /// Derive a child expiring after `timeout` or with its parent, whichever is first
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.child_with_deadline(deadline_after(timeout))
    }

    /// Derive a child expiring at `deadline` or with its parent, whichever is first
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self::build(
            self.inner.token.child_token(),
            Some(deadline),
            Some(self.clone()),
        )
    }

    fn build(token: CancellationToken, deadline: Option<Instant>, parent: Option<Context>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                token,
                deadline,
                reason: OnceLock::new(),
                parent,
            }),
        }
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.fire(CancelError::Canceled);
    }

    fn fire(&self, reason: CancelError) {
        let _ = self.inner.reason.set(reason);
        self.inner.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// The cancellation reason, or `None` while the context is live
    pub fn err(&self) -> Option<CancelError> {
        if let Some(reason) = self.inner.reason.get() {
            return Some(*reason);
        }
        if let Some(reason) = self.inner.parent.as_ref().and_then(Context::err) {
            return Some(reason);
        }
        if self.inner.deadline.is_some_and(|at| Instant::now() >= at) {
            self.fire(CancelError::DeadlineExceeded);
            return self.inner.reason.get().copied();
        }
        self.inner
            .token
            .is_cancelled()
            .then_some(CancelError::Canceled)
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        self.fire(CancelError::DeadlineExceeded);
                    }
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    /// Run `f` once this context is cancelled
    ///
    /// Aborting the returned handle unregisters the callback.
    pub fn on_cancel<F>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let ctx = self.clone();
        tokio::spawn(async move {
            ctx.done().await;
            f();
        })
    }

    /// Run `fut` until completion or cancellation, whichever comes first
    pub async fn run_until_cancelled<F>(&self, fut: F) -> Result<F::Output, CancelError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.done() => Err(cancel_reason(self)),
            out = fut => Ok(out),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    // Far-future timeouts saturate instead of overflowing the clock
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

#[async_trait]
impl Canceler for Context {
    async fn done(&self) {
        Context::done(self).await
    }

    fn err(&self) -> Option<CancelError> {
        Context::err(self)
    }
}

#[async_trait]
impl Canceler for CancellationToken {
    async fn done(&self) {
        self.cancelled().await
    }

    fn err(&self) -> Option<CancelError> {
        self.is_cancelled().then_some(CancelError::Canceled)
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
