//! Cell: lossy latest-value broadcast

use crate::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn get_returns_last_of_unobserved_sets(values in prop::collection::vec(any::<i64>(), 1..50)) {
        let cell = Cell::new(0i64);
        for v in &values {
            cell.set(*v);
        }
        prop_assert!(cell.has_update());
        prop_assert_eq!(cell.get(), *values.last().unwrap());
        prop_assert!(!cell.has_update());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn set_wakes_every_parked_waiter() {
    let cell = Arc::new(Cell::new(String::from("initial")));
    cell.get();

    let waiters: Vec<_> = (0..16)
        .map(|_| {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move { cell.wait(&Context::new()).await })
        })
        .collect();
    settle().await;

    cell.set("ready".to_string());
    for waiter in waiters {
        let value = within("waiter", waiter).await.unwrap().unwrap();
        assert_eq!(value, "ready");
    }
}

#[tokio::test]
async fn wait_with_expired_deadline_reports_it() {
    let cell = Cell::new(1u32);
    cell.get();

    let ctx = Context::with_timeout(std::time::Duration::from_millis(10));
    let err = within("deadline", cell.wait(&ctx)).await.unwrap_err();
    assert_eq!(err, CancelError::DeadlineExceeded);
    assert_eq!(cell.get(), 1);
}
