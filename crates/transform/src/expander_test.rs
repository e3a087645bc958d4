use std::sync::Arc;

use courier_protocol::{Target, TransformContext};
use courier_routing::TopicPattern;
use serde_json::json;

use super::*;
use crate::helpers::HelperOutcome;
use crate::route::{ResolvedTargets, Route};
use crate::testutil::MapCatalog;

fn catalog() -> MapCatalog {
    MapCatalog::new(&[("log", &["info", "crit"]), ("file", &["f01"])])
}

fn route_with(targets: ResolvedTargets) -> Route {
    Route {
        name: "test".into(),
        pattern: TopicPattern::parse("test/#").unwrap(),
        targets,
        filter: None,
        datamap: None,
        alldata: None,
        format: None,
        title: None,
        priority: None,
        retry: None,
        qos: 0,
        ignore_retained: None,
    }
}

#[test]
fn static_targets_pass_through() {
    let route = route_with(ResolvedTargets::Static(vec![
        Target::new("log", "info"),
        Target::new("file", "f01"),
    ]));
    let targets = expand_targets(&route, &TransformContext::new(), &catalog());
    assert_eq!(targets.len(), 2);
}

#[test]
fn template_interpolates_and_validates() {
    let route = route_with(ResolvedTargets::Template("log:{loglevel}".into()));

    let mut ctx = TransformContext::new();
    ctx.insert("loglevel", "crit");
    let targets = expand_targets(&route, &ctx, &catalog());
    assert_eq!(targets, vec![Target::new("log", "crit")]);
}

#[test]
fn template_with_unknown_target_yields_nothing() {
    let route = route_with(ResolvedTargets::Template("log:{loglevel}".into()));

    let mut ctx = TransformContext::new();
    ctx.insert("loglevel", "nonesuch");
    assert!(expand_targets(&route, &ctx, &catalog()).is_empty());
}

#[test]
fn template_with_missing_key_yields_nothing() {
    let route = route_with(ResolvedTargets::Template("log:{loglevel}".into()));
    assert!(expand_targets(&route, &TransformContext::new(), &catalog()).is_empty());
}

#[test]
fn computed_targets_are_validated() {
    let route = route_with(ResolvedTargets::Computed {
        name: "pick".into(),
        func: Arc::new(|_| {
            HelperOutcome::Keep(vec!["log:info".into(), "smtp:nonesuch".into()])
        }),
    });

    let targets = expand_targets(&route, &TransformContext::new(), &catalog());
    assert_eq!(targets, vec![Target::new("log", "info")]);
}

#[test]
fn computed_helper_sees_topic_and_known_targets() {
    let route = route_with(ResolvedTargets::Computed {
        name: "echo".into(),
        func: Arc::new(|args| {
            assert_eq!(args.topic, "test/x");
            assert_eq!(args.section, "test");
            assert!(args.known_targets.contains(&"file:f01".to_string()));
            HelperOutcome::Keep(vec!["file:f01".into()])
        }),
    });

    let mut ctx = TransformContext::new();
    ctx.insert("topic", "test/x");
    let targets = expand_targets(&route, &ctx, &catalog());
    assert_eq!(targets, vec![Target::new("file", "f01")]);
}

#[test]
fn computed_drop_and_error_yield_nothing() {
    let dropping = route_with(ResolvedTargets::Computed {
        name: "drop".into(),
        func: Arc::new(|_| HelperOutcome::Drop),
    });
    assert!(expand_targets(&dropping, &TransformContext::new(), &catalog()).is_empty());

    let failing = route_with(ResolvedTargets::Computed {
        name: "fail".into(),
        func: Arc::new(|_| HelperOutcome::error("boom")),
    });
    assert!(expand_targets(&failing, &TransformContext::new(), &catalog()).is_empty());
}

#[test]
fn resolve_address_service_shorthand() {
    let mut targets = resolve_address("s", "log", &catalog());
    targets.sort();
    assert_eq!(
        targets,
        vec![Target::new("log", "crit"), Target::new("log", "info")]
    );
}

#[test]
fn resolve_address_unknown_service_is_empty() {
    assert!(resolve_address("s", "smtp:ops", &catalog()).is_empty());
    assert!(resolve_address("s", "smtp", &catalog()).is_empty());
}

#[test]
fn template_values_can_be_numbers() {
    let route = route_with(ResolvedTargets::Template("log:{level}".into()));

    let mut ctx = TransformContext::new();
    ctx.insert("level", json!("info"));
    assert_eq!(
        expand_targets(&route, &ctx, &catalog()),
        vec![Target::new("log", "info")]
    );
}
