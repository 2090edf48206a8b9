//! TxLock: Shared / Reserved / Pending / Exclusive

use crate::prelude::*;
use std::sync::Arc;

#[tokio::test]
#[should_panic(expected = "pending lock requires the reserved lock")]
async fn pending_without_reserved_panics() {
    TxLock::new().pending().lock().await;
}

#[tokio::test]
#[should_panic(expected = "exclusive lock requires the pending lock")]
async fn exclusive_without_pending_panics() {
    let tx = TxLock::new();
    tx.reserved().lock().await;
    tx.exclusive().lock().await;
}

#[tokio::test]
async fn readers_and_one_writer_coexist() {
    let tx = TxLock::new();
    for _ in 0..8 {
        within("shared", tx.shared().lock()).await;
    }
    within("reserved", tx.reserved().lock()).await;

    assert_eq!(tx.shared_count(), 8);
    assert!(tx.is_reserved());
    assert_blocked("second writer", tx.reserved().lock()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn commit_sequence_drains_readers() {
    let tx = Arc::new(TxLock::new());
    tx.shared().lock().await;
    tx.shared().lock().await;

    tx.reserved().lock().await;
    tx.pending().lock().await;

    // New readers are held off while a commit is pending
    let reader = {
        let tx = Arc::clone(&tx);
        tokio::spawn(async move {
            tx.shared().lock().await;
            tx.shared().unlock();
        })
    };

    let writer = {
        let tx = Arc::clone(&tx);
        tokio::spawn(async move { tx.exclusive().lock().await })
    };
    settle().await;
    assert!(!reader.is_finished());
    assert!(!writer.is_finished());

    // Only the pre-existing readers gate exclusive
    tx.shared().unlock();
    settle().await;
    assert!(!writer.is_finished());
    tx.shared().unlock();
    within("exclusive", writer).await.unwrap();
    assert!(!reader.is_finished());

    tx.exclusive().unlock();
    tx.pending().unlock();
    tx.reserved().unlock();
    within("reader after commit", reader).await.unwrap();
    assert_eq!(tx.shared_count(), 0);
}

#[tokio::test]
async fn tx_lock_picks_facet_by_mode() {
    let tx = TxLock::new();

    let read = tx.tx_lock(true);
    read.lock().await;
    assert_eq!(tx.shared_count(), 1);
    read.unlock();

    let write = tx.tx_lock(false);
    write.lock().await;
    assert!(tx.is_reserved());
    assert_eq!(tx.shared_count(), 0);
    write.unlock();
    assert!(!tx.is_reserved());
}
