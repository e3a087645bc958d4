use bytes::Bytes;
use courier_protocol::{Target, TransformContext};

use super::*;

fn job(body: &str, target_name: &str, context: TransformContext) -> Job {
    Job {
        target: Target::new("file", target_name),
        title: None,
        body: body.into(),
        context,
        topic: "t".into(),
        payload: Bytes::from(body.to_string()),
        priority: 0,
        attempt: 0,
        retry_limit: 0,
        failover: false,
    }
}

fn ctx(toml: &str) -> ServiceContext {
    ServiceContext::new("file", &toml::from_str(toml).unwrap())
}

#[tokio::test]
async fn appends_body_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let toml = format!(
        "append_newline = true\n[targets]\nout = [\"{}\"]",
        path.display()
    );
    let ctx = ctx(&toml);

    assert!(
        FileNotifier
            .deliver(&ctx, &job("one", "out", TransformContext::new()))
            .await
            .unwrap()
    );
    assert!(
        FileNotifier
            .deliver(&ctx, &job("two", "out", TransformContext::new()))
            .await
            .unwrap()
    );

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "one\ntwo\n");
}

#[tokio::test]
async fn overwrite_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let toml = format!("overwrite = true\n[targets]\nout = [\"{}\"]", path.display());
    let ctx = ctx(&toml);

    FileNotifier
        .deliver(&ctx, &job("first", "out", TransformContext::new()))
        .await
        .unwrap();
    FileNotifier
        .deliver(&ctx, &job("second", "out", TransformContext::new()))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
}

#[tokio::test]
async fn path_is_interpolated_against_context() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "[targets]\nout = [\"{}/{{device}}.log\"]",
        dir.path().display()
    );
    let ctx = ctx(&toml);

    let mut context = TransformContext::new();
    context.insert("device", "kitchen");

    assert!(
        FileNotifier
            .deliver(&ctx, &job("21C", "out", context))
            .await
            .unwrap()
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("kitchen.log")).unwrap(),
        "21C"
    );
}

#[tokio::test]
async fn unwritable_path_is_a_retryable_failure() {
    let ctx = ctx("[targets]\nout = [\"/nonexistent-dir-courier/x.log\"]");
    assert!(
        !FileNotifier
            .deliver(&ctx, &job("x", "out", TransformContext::new()))
            .await
            .unwrap()
    );
}
