//! Managed locks: mutual exclusion and table cleanup

use crate::prelude::*;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn holders_of_one_key_never_overlap() {
    let manager = LockManager::new();
    let inside = Arc::new(AtomicI32::new(0));

    let workers: Vec<_> = (0..32)
        .map(|_| {
            let manager = manager.clone();
            let inside = Arc::clone(&inside);
            tokio::spawn(async move {
                let mut lock = manager.access("shared-key");
                for _ in 0..20 {
                    lock.lock().await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    assert!((0..=1).contains(&now), "{now} holders inside");
                    tokio::task::yield_now().await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                    lock.unlock();
                }
            })
        })
        .collect();

    for worker in workers {
        within("worker", worker).await.unwrap();
    }
    assert_eq!(inside.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn table_is_empty_after_all_cycles() {
    let manager = LockManager::new();

    let workers: Vec<_> = (0..24)
        .map(|i| {
            let manager = manager.clone();
            tokio::spawn(async move {
                let key = if i % 2 == 0 { "even" } else { "odd" };
                for _ in 0..10 {
                    let mut lock = manager.access(key);
                    match i % 3 {
                        0 => {
                            lock.lock().await;
                        }
                        1 => {
                            if lock.try_lock().is_none() {
                                continue;
                            }
                        }
                        _ => {
                            lock.lock_with_cancellation(&Context::new()).await.unwrap();
                        }
                    }
                    lock.unlock();
                }
            })
        })
        .collect();

    for worker in workers {
        within("worker", worker).await.unwrap();
    }
    assert!(manager.is_empty(), "leftover keys: {:?}", manager.keys());
}

#[tokio::test]
async fn different_keys_do_not_contend() {
    let manager = LockManager::new();
    let mut a = manager.access("a");
    let mut b = manager.access("b");

    a.lock().await;
    assert!(within("other key", b.lock_timeout(SETTLE)).await.is_some());
    assert_eq!(manager.len(), 2);

    a.unlock();
    b.unlock();
    assert!(manager.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn abandoned_attempts_do_not_pin_the_key() {
    let manager = LockManager::new();
    let mut holder = manager.access("contended");
    holder.lock().await;

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move {
                let mut lock = manager.access("contended");
                lock.lock().await;
            })
        })
        .collect();
    settle().await;
    for waiter in &waiters {
        waiter.abort();
    }
    for waiter in waiters {
        assert!(waiter.await.unwrap_err().is_cancelled());
    }

    holder.unlock();
    assert!(manager.is_empty(), "leftover keys: {:?}", manager.keys());
}
