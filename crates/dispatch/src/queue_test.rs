use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use courier_protocol::{Target, TransformContext};

use super::*;

fn job(body: &str) -> Job {
    Job {
        target: Target::new("log", "info"),
        title: None,
        body: body.into(),
        context: TransformContext::new(),
        topic: "t".into(),
        payload: Bytes::from(body.to_string()),
        priority: 0,
        attempt: 0,
        retry_limit: 0,
        failover: false,
    }
}

#[tokio::test]
async fn fifo_order() {
    let queue = JobQueue::new(10);
    assert!(matches!(queue.push(job("a")), Push::Queued));
    assert!(matches!(queue.push(job("b")), Push::Queued));
    assert!(matches!(queue.push(job("c")), Push::Queued));

    assert_eq!(queue.pop().await.unwrap().body, "a");
    assert_eq!(queue.pop().await.unwrap().body, "b");
    assert_eq!(queue.pop().await.unwrap().body, "c");
}

#[tokio::test]
async fn overflow_drops_oldest() {
    let queue = JobQueue::new(2);
    queue.push(job("a"));
    queue.push(job("b"));

    match queue.push(job("c")) {
        Push::DroppedOldest(dropped) => assert_eq!(dropped.body, "a"),
        other => panic!("expected DroppedOldest, got {other:?}"),
    }

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop().await.unwrap().body, "b");
    assert_eq!(queue.pop().await.unwrap().body, "c");
}

#[tokio::test]
async fn pop_waits_for_push() {
    let queue = Arc::new(JobQueue::new(4));

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.pop().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    queue.push(job("late"));

    let received = consumer.await.unwrap().unwrap();
    assert_eq!(received.body, "late");
}

#[tokio::test]
async fn close_drains_then_ends() {
    let queue = JobQueue::new(4);
    queue.push(job("a"));
    queue.push(job("b"));
    queue.close();

    // Remaining jobs still come out, then None.
    assert_eq!(queue.pop().await.unwrap().body, "a");
    assert_eq!(queue.pop().await.unwrap().body, "b");
    assert!(queue.pop().await.is_none());
}

#[tokio::test]
async fn push_after_close_is_rejected() {
    let queue = JobQueue::new(4);
    queue.close();
    assert!(matches!(queue.push(job("x")), Push::Closed(_)));
    assert!(queue.is_empty());
}

#[tokio::test]
async fn close_wakes_blocked_consumer() {
    let queue = Arc::new(JobQueue::new(4));

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.pop().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    queue.close();

    assert!(consumer.await.unwrap().is_none());
}

#[test]
fn capacity_is_at_least_one() {
    assert_eq!(JobQueue::new(0).capacity(), 1);
}
