//! HTTP notifier
//!
//! POSTs one JSON document per job to the URL named by the target's first
//! parameter:
//!
//! ```json
//! {"topic": "...", "title": "...", "message": "...", "data": {...}}
//! ```
//!
//! The registry's per-job timeout bounds the whole request.

use async_trait::async_trait;
use courier_protocol::Job;
use serde_json::json;

use crate::{Notifier, ServiceContext, ServiceError};

/// Notifier that posts jobs to HTTP endpoints
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    /// Create the notifier with a shared connection pool
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn deliver(&self, ctx: &ServiceContext, job: &Job) -> Result<bool, ServiceError> {
        let Some(url) = ctx.first_param(&job.target.name) else {
            tracing::warn!(
                service = %ctx.name,
                target = %job.target.name,
                "http target declares no URL parameter"
            );
            return Ok(false);
        };

        let document = json!({
            "topic": job.topic,
            "title": job.title,
            "message": job.body,
            "data": job.context.as_map(),
        });

        match self.client.post(url).json(&document).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                tracing::warn!(
                    service = %ctx.name,
                    url = %url,
                    status = %response.status(),
                    "http endpoint rejected notification"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(
                    service = %ctx.name,
                    url = %url,
                    error = %e,
                    "cannot post notification"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use courier_protocol::{Target, TransformContext};

    #[tokio::test]
    async fn missing_url_param_fails_without_network() {
        let ctx = ServiceContext::new("http", &toml::from_str("[targets]\nhook = []").unwrap());
        let job = Job {
            target: Target::new("http", "hook"),
            title: None,
            body: "x".into(),
            context: TransformContext::new(),
            topic: "t".into(),
            payload: Bytes::from_static(b"x"),
            priority: 0,
            attempt: 0,
            retry_limit: 0,
            failover: false,
        };

        assert!(!HttpNotifier::new().deliver(&ctx, &job).await.unwrap());
    }
}
