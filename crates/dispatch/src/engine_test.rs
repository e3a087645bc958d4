use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use courier_config::ServiceConfig;
use courier_protocol::{Job, Target, TransformContext};
use courier_services::{Notifier, PluginSet, ServiceContext, ServiceError, ServiceRegistry};
use tokio::sync::mpsc;

use super::*;

/// Notifier that records every job it sees and reports a fixed outcome
struct RecordingNotifier {
    kind: &'static str,
    outcome: bool,
    seen: mpsc::UnboundedSender<Job>,
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn deliver(&self, _: &ServiceContext, job: &Job) -> Result<bool, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.seen.send(job.clone());
        Ok(self.outcome)
    }
}

struct Fixture {
    registry: Arc<ServiceRegistry>,
    ok_rx: mpsc::UnboundedReceiver<Job>,
    flaky_rx: mpsc::UnboundedReceiver<Job>,
    flaky_calls: Arc<AtomicU64>,
}

/// Registry with an always-succeeding `rec` service and an always-failing
/// `flaky` service, one target each (plus `rec:other` for fan-out)
fn fixture() -> Fixture {
    let (ok_tx, ok_rx) = mpsc::unbounded_channel();
    let (flaky_tx, flaky_rx) = mpsc::unbounded_channel();
    let flaky_calls = Arc::new(AtomicU64::new(0));

    let mut plugins = PluginSet::new();
    plugins.register(Arc::new(RecordingNotifier {
        kind: "rec",
        outcome: true,
        seen: ok_tx,
        calls: Arc::new(AtomicU64::new(0)),
    }));
    plugins.register(Arc::new(RecordingNotifier {
        kind: "flaky",
        outcome: false,
        seen: flaky_tx,
        calls: Arc::clone(&flaky_calls),
    }));

    let mut configs: BTreeMap<String, ServiceConfig> = BTreeMap::new();
    configs.insert(
        "rec".into(),
        toml::from_str("[targets]\nok = []\nother = []").unwrap(),
    );
    configs.insert("flaky".into(), toml::from_str("[targets]\nx = []").unwrap());

    let registry =
        Arc::new(ServiceRegistry::build(&configs, &plugins, Duration::from_secs(5)).unwrap());

    Fixture {
        registry,
        ok_rx,
        flaky_rx,
        flaky_calls,
    }
}

fn job(target: Target, body: &str, retry_limit: u32) -> Job {
    Job {
        target,
        title: None,
        body: body.into(),
        context: TransformContext::new(),
        topic: "test/topic".into(),
        payload: Bytes::from(body.to_string()),
        priority: 0,
        attempt: 0,
        retry_limit,
        failover: false,
    }
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Job>) -> Job {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("channel closed")
}

#[tokio::test]
async fn jobs_are_delivered_in_enqueue_order() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        Vec::new(),
        DispatchOptions::default(),
    );

    for body in ["one", "two", "three"] {
        assert!(engine.enqueue(job(Target::new("rec", "ok"), body, 0)));
    }

    assert_eq!(recv(&mut fx.ok_rx).await.body, "one");
    assert_eq!(recv(&mut fx.ok_rx).await.body, "two");
    assert_eq!(recv(&mut fx.ok_rx).await.body, "three");

    engine.shutdown(Duration::from_secs(1)).await;
    assert_eq!(engine.metrics().jobs_delivered, 3);
}

#[tokio::test]
async fn one_queue_per_declared_target() {
    let fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        Vec::new(),
        DispatchOptions::default(),
    );

    // rec:ok, rec:other, flaky:x
    assert_eq!(engine.queue_count(), 3);
    engine.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn fan_out_lands_on_separate_queues() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        Vec::new(),
        DispatchOptions::default(),
    );

    engine.enqueue(job(Target::new("rec", "ok"), "a", 0));
    engine.enqueue(job(Target::new("rec", "other"), "a", 0));

    let first = recv(&mut fx.ok_rx).await;
    let second = recv(&mut fx.ok_rx).await;
    let mut targets = vec![first.target.to_string(), second.target.to_string()];
    targets.sort();
    assert_eq!(targets, vec!["rec:ok", "rec:other"]);

    engine.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn failed_job_moves_to_failover_targets() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        vec![Target::new("rec", "ok")],
        DispatchOptions::default(),
    );

    // Retry limit 0: first failure goes straight to failover.
    engine.enqueue(job(Target::new("flaky", "x"), "doomed", 0));

    let attempted = recv(&mut fx.flaky_rx).await;
    assert_eq!(attempted.body, "doomed");
    assert!(!attempted.failover);

    let failover = recv(&mut fx.ok_rx).await;
    assert_eq!(failover.body, "doomed");
    assert_eq!(failover.target, Target::new("rec", "ok"));
    assert!(failover.failover);
    assert_eq!(failover.attempt, 0);

    engine.shutdown(Duration::from_secs(1)).await;
    let metrics = engine.metrics();
    assert_eq!(metrics.jobs_failed_over, 1);
    assert_eq!(metrics.jobs_delivered, 1);
}

#[tokio::test]
async fn retries_before_failing_over() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        vec![Target::new("rec", "ok")],
        DispatchOptions {
            queue_capacity: 10,
            retry_backoff: Duration::from_millis(5),
        },
    );

    engine.enqueue(job(Target::new("flaky", "x"), "stubborn", 2));

    // Original attempt plus two retries.
    for expected_attempt in [0, 1, 2] {
        let seen = recv(&mut fx.flaky_rx).await;
        assert_eq!(seen.attempt, expected_attempt);
    }
    assert_eq!(fx.flaky_calls.load(Ordering::SeqCst), 3);

    // Then the failover copy arrives.
    let failover = recv(&mut fx.ok_rx).await;
    assert!(failover.failover);

    engine.shutdown(Duration::from_secs(1)).await;
    assert_eq!(engine.metrics().jobs_retried, 2);
}

#[tokio::test]
async fn failed_failover_job_is_discarded() {
    let mut fx = fixture();
    // Failover points at the always-failing service itself.
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        vec![Target::new("flaky", "x")],
        DispatchOptions::default(),
    );

    engine.enqueue(job(Target::new("flaky", "x"), "doomed", 0));

    // First the original, then the failover copy, then nothing more.
    let original = recv(&mut fx.flaky_rx).await;
    assert!(!original.failover);
    let failover = recv(&mut fx.flaky_rx).await;
    assert!(failover.failover);

    // No recursion: the failed failover job is dropped.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fx.flaky_rx.try_recv().is_err());

    engine.shutdown(Duration::from_secs(1)).await;
    assert_eq!(engine.metrics().jobs_dropped_failover, 1);
}

#[tokio::test]
async fn broker_event_reaches_failover_targets() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        vec![Target::new("rec", "ok")],
        DispatchOptions::default(),
    );

    engine.notify_failover("brokerdisconnected", "Broker connection lost");

    let event = recv(&mut fx.ok_rx).await;
    assert_eq!(event.title.as_deref(), Some("brokerdisconnected"));
    assert_eq!(event.body, "Broker connection lost");
    assert!(event.failover);

    engine.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn shutdown_drains_pending_jobs() {
    let mut fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        Vec::new(),
        DispatchOptions::default(),
    );

    for i in 0..20 {
        engine.enqueue(job(Target::new("rec", "ok"), &format!("j{i}"), 0));
    }
    engine.shutdown(Duration::from_secs(5)).await;

    let mut drained = 0;
    while fx.ok_rx.try_recv().is_ok() {
        drained += 1;
    }
    assert_eq!(drained, 20);
    assert_eq!(engine.metrics().jobs_dropped_shutdown, 0);
}

#[tokio::test]
async fn unknown_target_job_is_rejected() {
    let fx = fixture();
    let engine = DispatchEngine::start(
        Arc::clone(&fx.registry),
        Vec::new(),
        DispatchOptions::default(),
    );

    assert!(!engine.enqueue(job(Target::new("smtp", "ops"), "x", 0)));
    engine.shutdown(Duration::from_secs(1)).await;
}
