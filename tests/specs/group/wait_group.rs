//! SafeWaitGroup close races

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn accepted_work_finishes_before_wait_returns() {
    for _ in 0..10 {
        let wg = Arc::new(SafeWaitGroup::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));

        let adders: Vec<_> = (0..32)
            .map(|_| {
                let wg = Arc::clone(&wg);
                let finished = Arc::clone(&finished);
                let accepted = Arc::clone(&accepted);
                tokio::spawn(async move {
                    if wg.add(1).is_err() {
                        return;
                    }
                    accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        wg.done();
                    });
                })
            })
            .collect();

        tokio::task::yield_now().await;
        within("wait", wg.wait()).await;
        for adder in adders {
            adder.await.unwrap();
        }

        // Anything accepted before the close has finished by now
        within("stragglers", wg.wait()).await;
        assert_eq!(finished.load(Ordering::SeqCst), accepted.load(Ordering::SeqCst));
        assert_eq!(wg.count(), 0);
        assert_eq!(wg.add(1), Err(GroupError::Closed));
    }
}
