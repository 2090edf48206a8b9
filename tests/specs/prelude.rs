//! Shared helpers for behavioral specs

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

pub use consort_core::*;

/// Upper bound for anything expected to finish promptly
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Short pause used to let spawned tasks park
pub const SETTLE: Duration = Duration::from_millis(30);

/// Await `fut`, failing the spec if it takes longer than [`PATIENCE`]
pub async fn within<F: Future>(what: &str, fut: F) -> F::Output {
    match tokio::time::timeout(PATIENCE, fut).await {
        Ok(out) => out,
        Err(_) => panic!("timed out waiting for {what}"),
    }
}

/// Assert that `fut` is still pending after [`SETTLE`]
pub async fn assert_blocked<F: Future>(what: &str, fut: F) {
    if tokio::time::timeout(SETTLE, fut).await.is_ok() {
        panic!("{what} should have blocked");
    }
}

pub async fn settle() {
    tokio::time::sleep(SETTLE).await;
}
