//! Log notifier
//!
//! Emits the notification body through the engine's own logging at the
//! level named by the target's first parameter (`debug`, `info`, `warn`,
//! `error` or `crit`).

use async_trait::async_trait;
use courier_protocol::Job;

use crate::{Notifier, ServiceContext, ServiceError};

/// Notifier that writes jobs to the daemon log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn kind(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, ctx: &ServiceContext, job: &Job) -> Result<bool, ServiceError> {
        let Some(level) = ctx.first_param(&job.target.name) else {
            tracing::warn!(
                service = %ctx.name,
                target = %job.target.name,
                "log target declares no level parameter"
            );
            return Ok(false);
        };

        match level {
            "debug" => tracing::debug!(topic = %job.topic, "{}", job.body),
            "info" => tracing::info!(topic = %job.topic, "{}", job.body),
            "warn" => tracing::warn!(topic = %job.topic, "{}", job.body),
            "error" | "crit" => tracing::error!(topic = %job.topic, "{}", job.body),
            other => {
                tracing::warn!(
                    service = %ctx.name,
                    level = %other,
                    "cannot log at unknown level"
                );
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use courier_protocol::{Target, TransformContext};

    fn job(target_name: &str) -> Job {
        Job {
            target: Target::new("log", target_name),
            title: None,
            body: "hello".into(),
            context: TransformContext::new(),
            topic: "t".into(),
            payload: Bytes::from_static(b"hello"),
            priority: 0,
            attempt: 0,
            retry_limit: 0,
            failover: false,
        }
    }

    fn ctx(toml: &str) -> ServiceContext {
        ServiceContext::new("log", &toml::from_str(toml).unwrap())
    }

    #[tokio::test]
    async fn delivers_at_known_level() {
        let ctx = ctx("[targets]\ninfo = [\"info\"]");
        assert!(LogNotifier.deliver(&ctx, &job("info")).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_level_is_a_retryable_failure() {
        let ctx = ctx("[targets]\nweird = [\"verbose\"]");
        assert!(!LogNotifier.deliver(&ctx, &job("weird")).await.unwrap());
    }

    #[tokio::test]
    async fn missing_params_fail() {
        let ctx = ctx("[targets]\nempty = []");
        assert!(!LogNotifier.deliver(&ctx, &job("empty")).await.unwrap());
    }
}
