//! TaskGroup and MultiErrGroup

use crate::prelude::*;
use std::collections::HashSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_aggregates_unit_errors() {
    let group = TaskGroup::new();
    for i in 0..5 {
        group
            .go(move |_ctx| async move {
                match i {
                    0 => Err("alpha".into()),
                    2 => Err("beta".into()),
                    _ => Ok(()),
                }
            })
            .unwrap();
    }

    settle().await;
    let err = within("stop", group.stop()).await.unwrap_err();
    let got: HashSet<String> = err.errors().iter().map(|e| e.to_string()).collect();
    assert_eq!(got, HashSet::from(["alpha".to_string(), "beta".to_string()]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_cancels_and_closes() {
    let group = TaskGroup::new();
    for _ in 0..4 {
        group
            .go(|ctx| async move {
                ctx.done().await;
                Ok(())
            })
            .unwrap();
    }

    within("stop", group.stop()).await.unwrap();
    assert_eq!(group.go(|_ctx| async { Ok(()) }), Err(GroupError::Closed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn multi_err_group_ignores_cancellation() {
    let group = MultiErrGroup::new();
    let ctx = Context::new();
    for _ in 0..3 {
        let ctx = ctx.clone();
        group.go(async move {
            ctx.done().await;
            Err(Box::new(ctx.err().unwrap_or(CancelError::Canceled)) as TaskError)
        });
    }
    group.go(async { Err("real failure".into()) });

    settle().await;
    ctx.cancel();
    let errors = within("wait", group.wait()).await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "real failure");
}
