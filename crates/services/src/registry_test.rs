use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use courier_protocol::{Target, TransformContext};
use courier_transform::TargetCatalog;

use super::*;
use crate::{Notifier, ServiceContext, ServiceError};

fn services(toml: &str) -> std::collections::BTreeMap<String, courier_config::ServiceConfig> {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        services: std::collections::BTreeMap<String, courier_config::ServiceConfig>,
    }
    toml::from_str::<Wrapper>(toml).unwrap().services
}

fn job(target: Target) -> courier_protocol::Job {
    courier_protocol::Job {
        target,
        title: None,
        body: "x".into(),
        context: TransformContext::new(),
        topic: "t".into(),
        payload: Bytes::from_static(b"x"),
        priority: 0,
        attempt: 0,
        retry_limit: 0,
        failover: false,
    }
}

#[tokio::test]
async fn builds_and_dispatches_to_null() {
    let configs = services(
        r#"
[services.null]
[services.null.targets]
sink = []
"#,
    );
    let registry =
        ServiceRegistry::build(&configs, &PluginSet::builtin(), Duration::from_secs(5)).unwrap();
    registry.init_all().await.unwrap();

    let delivered = registry
        .dispatch(&job(Target::new("null", "sink")))
        .await
        .unwrap();
    assert!(delivered);
}

#[tokio::test]
async fn unknown_kind_is_fatal() {
    let configs = services(
        r#"
[services.smtp]
[services.smtp.targets]
ops = ["ops@example.org"]
"#,
    );
    let err =
        ServiceRegistry::build(&configs, &PluginSet::builtin(), Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, ServiceError::UnknownKind { .. }));
}

#[tokio::test]
async fn disabled_service_is_skipped() {
    let configs = services(
        r#"
[services.null]
enabled = false
[services.null.targets]
sink = []
"#,
    );
    let registry =
        ServiceRegistry::build(&configs, &PluginSet::builtin(), Duration::from_secs(5)).unwrap();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn unknown_target_is_an_error() {
    let configs = services(
        r#"
[services.null]
[services.null.targets]
sink = []
"#,
    );
    let registry =
        ServiceRegistry::build(&configs, &PluginSet::builtin(), Duration::from_secs(5)).unwrap();

    let err = registry
        .dispatch(&job(Target::new("null", "nonesuch")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownTarget { .. }));

    let err = registry
        .dispatch(&job(Target::new("smtp", "ops")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownTarget { .. }));
}

#[tokio::test]
async fn catalog_view_matches_configuration() {
    let configs = services(
        r#"
[services.log]
[services.log.targets]
info = ["info"]
crit = ["crit"]

[services.file]
[services.file.targets]
f01 = ["/tmp/f01"]
"#,
    );
    let registry =
        ServiceRegistry::build(&configs, &PluginSet::builtin(), Duration::from_secs(5)).unwrap();

    assert!(registry.has_service("log"));
    assert!(!registry.has_service("smtp"));
    assert!(registry.has_target("log", "crit"));
    assert!(!registry.has_target("log", "nonesuch"));

    let mut targets = registry.service_targets("log");
    targets.sort();
    assert_eq!(targets, vec!["crit", "info"]);

    assert_eq!(
        registry.all_addresses(),
        vec!["file:f01", "log:crit", "log:info"]
    );
}

struct SlowNotifier;

#[async_trait]
impl Notifier for SlowNotifier {
    fn kind(&self) -> &'static str {
        "slow"
    }

    async fn deliver(&self, _: &ServiceContext, _: &courier_protocol::Job) -> Result<bool, ServiceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(true)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_plugin_times_out() {
    let configs = services(
        r#"
[services.slow]
[services.slow.targets]
x = []
"#,
    );
    let mut plugins = PluginSet::new();
    plugins.register(Arc::new(SlowNotifier));

    let registry = ServiceRegistry::build(&configs, &plugins, Duration::from_millis(50)).unwrap();
    let err = registry
        .dispatch(&job(Target::new("slow", "x")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Timeout { .. }));
}

struct PanickyNotifier;

#[async_trait]
impl Notifier for PanickyNotifier {
    fn kind(&self) -> &'static str {
        "panicky"
    }

    async fn deliver(&self, _: &ServiceContext, _: &courier_protocol::Job) -> Result<bool, ServiceError> {
        panic!("plugin exploded");
    }
}

#[tokio::test]
async fn plugin_panic_is_contained() {
    let configs = services(
        r#"
[services.panicky]
[services.panicky.targets]
x = []
"#,
    );
    let mut plugins = PluginSet::new();
    plugins.register(Arc::new(PanickyNotifier));

    let registry = ServiceRegistry::build(&configs, &plugins, Duration::from_secs(5)).unwrap();
    let err = registry
        .dispatch(&job(Target::new("panicky", "x")))
        .await
        .unwrap_err();
    match err {
        ServiceError::Panic { detail, .. } => assert!(detail.contains("plugin exploded")),
        other => panic!("expected panic error, got {other:?}"),
    }
}
