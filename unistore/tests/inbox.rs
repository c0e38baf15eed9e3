//! Async work re-entering the store through an inbox

#![cfg(feature = "inbox")]

use tokio::sync::oneshot;

use unistore::prelude::*;

#[derive(Debug, Default)]
struct Downloads {
    finished: Vec<u32>,
}

#[tokio::test]
async fn test_results_arrive_in_completion_order() {
    let store: Store<Downloads> = Store::new(Downloads::default(), vec![]);
    let (tx, mut rx) = inbox();

    let mut gates = Vec::new();
    for id in 0..3u32 {
        let (open, gate) = oneshot::channel::<()>();
        gates.push(open);
        let tx = tx.clone();
        tokio::spawn(async move {
            if gate.await.is_ok() {
                tx.send(move |d: &mut Downloads| {
                    d.finished.push(id);
                    None
                });
            }
        });
    }
    drop(tx);

    // finish the downloads last to first, one at a time
    while let Some(open) = gates.pop() {
        open.send(()).unwrap();
        assert_eq!(rx.recv_into(&store).await, 1);
    }
    assert_eq!(rx.recv_into(&store).await, 0);

    assert_eq!(store.state().finished, vec![2, 1, 0]);
}

#[tokio::test]
async fn test_closed_inbox_rejects_new_actions() {
    let store: Store<Downloads> = Store::new(Downloads::default(), vec![]);
    let (tx, mut rx) = inbox();
    assert!(tx.send(|d: &mut Downloads| {
        d.finished.push(7);
        None
    }));

    rx.close();
    assert!(!tx.send(|d: &mut Downloads| {
        d.finished.push(8);
        None
    }));
    assert_eq!(store.pump(&mut rx), 1);
    assert_eq!(store.state().finished, vec![7]);
}
