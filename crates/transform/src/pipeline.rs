//! The transform pipeline
//!
//! `process(route, message)` runs the ordered stages for one (route,
//! message) pair and produces one [`Job`] per expanded target. The pipeline
//! is side-effect free up to the point the caller enqueues the jobs, and it
//! never stops the ingest path: helper failures degrade to the best partial
//! context already accumulated.

use std::sync::Arc;

use chrono::Utc;
use courier_config::PrioritySpec;
use courier_protocol::{Job, Message, TransformContext};

use crate::expander::{TargetCatalog, expand_targets};
use crate::helpers::{FilterArgs, HelperOutcome};
use crate::route::{Route, RouteFormat};
use crate::template;

/// Engine-wide pipeline settings
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSettings {
    /// Drop retained messages unless the route overrides
    pub skip_retained: bool,

    /// Drop messages whose format template references missing keys, instead
    /// of rendering the literal placeholder
    pub strict_format: bool,

    /// Default re-delivery attempts before failover, for routes without
    /// their own `retry`
    pub retry_limit: u32,
}

/// Stateless stage runner for the transform pipeline
pub struct Pipeline {
    catalog: Arc<dyn TargetCatalog>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Create a pipeline over the given service catalog
    pub fn new(catalog: Arc<dyn TargetCatalog>, settings: PipelineSettings) -> Self {
        Self { catalog, settings }
    }

    /// Run all stages for one (route, message) pair
    ///
    /// Returns one job per expanded target; an empty vector means the
    /// message was filtered, suppressed, or had no valid targets (each case
    /// already logged at the appropriate level).
    pub fn process(&self, route: &Route, msg: &Message) -> Vec<Job> {
        // Stage 1: retained filter.
        if msg.retained && route.ignore_retained.unwrap_or(self.settings.skip_retained) {
            tracing::debug!(section = %route.name, topic = %msg.topic, "skipping retained message");
            return Vec::new();
        }

        // Stage 2: base context from the message itself.
        let mut ctx = base_context(route, msg);

        // Stage 3: payload decode. Failure is never fatal.
        match msg.json() {
            Some(serde_json::Value::Object(map)) => ctx.merge(map),
            Some(_) => {
                tracing::trace!(topic = %msg.topic, "payload is JSON but not an object, ignoring")
            }
            None => tracing::trace!(topic = %msg.topic, "payload is not JSON"),
        }

        // Stage 4: filter helper. A failed filter fails towards delivery.
        if let Some((name, func)) = &route.filter {
            let outcome = func(FilterArgs {
                topic: &msg.topic,
                payload: &msg.payload,
                section: &route.name,
                context: &ctx,
            });
            match outcome {
                HelperOutcome::Keep(true) | HelperOutcome::Drop => {
                    tracing::debug!(
                        section = %route.name,
                        topic = %msg.topic,
                        helper = %name,
                        "filter skipped message"
                    );
                    return Vec::new();
                }
                HelperOutcome::Keep(false) => {}
                HelperOutcome::Error(detail) => {
                    tracing::warn!(
                        section = %route.name,
                        helper = %name,
                        error = %detail,
                        "cannot invoke filter, delivering anyway"
                    );
                }
            }
        }

        // Stage 5: datamap helper.
        if let Some((name, func)) = &route.datamap {
            match func(&msg.topic, &ctx) {
                HelperOutcome::Keep(map) => ctx.merge(map),
                HelperOutcome::Drop => {}
                HelperOutcome::Error(detail) => {
                    tracing::warn!(
                        section = %route.name,
                        helper = %name,
                        error = %detail,
                        "cannot invoke datamap, continuing with partial context"
                    );
                }
            }
        }

        // Stage 6: body format.
        let body = match self.render_body(route, msg, &ctx) {
            Some(body) => body,
            None => return Vec::new(),
        };

        if body.is_empty() {
            tracing::warn!(
                section = %route.name,
                topic = %msg.topic,
                "notification suppressed: empty message"
            );
            return Vec::new();
        }

        let title = route.title.as_ref().map(|t| template::render(t, &ctx));
        let priority = self.resolve_priority(route, &ctx);

        // Stage 7: target expansion.
        let targets = expand_targets(route, &ctx, self.catalog.as_ref());
        if targets.is_empty() {
            return Vec::new();
        }

        // Stage 8: one job per target, each with its own alldata-augmented
        // context snapshot.
        let mut jobs = Vec::with_capacity(targets.len());
        for target in targets {
            let mut job_ctx = ctx.clone();

            if let Some((name, func)) = &route.alldata {
                match func(&msg.topic, &job_ctx) {
                    HelperOutcome::Keep(map) => job_ctx.merge(map),
                    HelperOutcome::Drop => {}
                    HelperOutcome::Error(detail) => {
                        tracing::warn!(
                            section = %route.name,
                            helper = %name,
                            error = %detail,
                            "cannot invoke alldata, continuing with partial context"
                        );
                    }
                }
            }

            tracing::debug!(
                section = %route.name,
                topic = %msg.topic,
                target = %target,
                "message routed"
            );

            jobs.push(Job {
                target,
                title: title.clone(),
                body: body.clone(),
                context: job_ctx,
                topic: msg.topic.clone(),
                payload: msg.payload.clone(),
                priority,
                attempt: 0,
                retry_limit: route.retry.unwrap_or(self.settings.retry_limit),
                failover: false,
            });
        }

        jobs
    }

    /// Produce the notification body; `None` drops the message for this
    /// route
    fn render_body(&self, route: &Route, msg: &Message, ctx: &TransformContext) -> Option<String> {
        let body = match &route.format {
            None => msg.payload_text().into_owned(),

            Some(RouteFormat::Template(t)) => {
                if self.settings.strict_format {
                    match template::render_strict(t, ctx) {
                        Ok(body) => body,
                        Err(e) => {
                            tracing::warn!(
                                section = %route.name,
                                template = %t,
                                error = %e,
                                "strict format failed, dropping message"
                            );
                            return None;
                        }
                    }
                } else {
                    template::render(t, ctx)
                }
            }

            Some(RouteFormat::Function { name, func }) => {
                match func(&msg.payload_text(), ctx) {
                    HelperOutcome::Keep(body) => body,
                    HelperOutcome::Drop => {
                        tracing::debug!(
                            section = %route.name,
                            helper = %name,
                            "format helper suppressed message"
                        );
                        return None;
                    }
                    HelperOutcome::Error(detail) => {
                        tracing::warn!(
                            section = %route.name,
                            helper = %name,
                            error = %detail,
                            "cannot invoke format helper, using raw payload"
                        );
                        msg.payload_text().into_owned()
                    }
                }
            }
        };

        // Configuration files cannot hold raw newlines in single-line
        // strings, so a literal \n means one.
        Some(body.replace("\\n", "\n"))
    }

    /// Resolve the route's priority against the context, defaulting to 0
    fn resolve_priority(&self, route: &Route, ctx: &TransformContext) -> i32 {
        match &route.priority {
            None => 0,
            Some(PrioritySpec::Fixed(n)) => *n,
            Some(PrioritySpec::Template(t)) => {
                let rendered = template::render(t, ctx);
                rendered.trim().parse().unwrap_or_else(|_| {
                    tracing::debug!(
                        section = %route.name,
                        value = %rendered,
                        "failed to determine priority, defaulting to zero"
                    );
                    0
                })
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Build the base context for one (route, message) pair
///
/// Message fields, wildcard captures (`_topic`), positional topic segments
/// (`_topic_parts`) and the time fields derived from the receive instant.
/// Array entries are additionally flattened to `name[i]` keys so templates
/// can reference them.
fn base_context(route: &Route, msg: &Message) -> TransformContext {
    let mut ctx = TransformContext::new();

    ctx.insert("topic", msg.topic.clone());
    ctx.insert("payload", msg.payload_text().into_owned());
    ctx.insert("qos", msg.qos);
    ctx.insert("retained", msg.retained);

    if let Some(captures) = route.pattern.captures(&msg.topic) {
        for (i, capture) in captures.iter().enumerate() {
            ctx.insert(format!("_topic[{i}]"), capture.clone());
        }
        ctx.insert("_topic", captures);
    }

    let parts: Vec<String> = msg.topic_levels().map(str::to_string).collect();
    for (i, part) in parts.iter().enumerate() {
        ctx.insert(format!("_topic_parts[{i}]"), part.clone());
    }
    ctx.insert("_topic_parts", parts);

    let t = msg.received_at;
    ctx.insert("_dtepoch", t.timestamp());
    ctx.insert(
        "_dtiso",
        t.with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%S%.6fZ")
            .to_string(),
    );
    ctx.insert("_ltiso", t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
    ctx.insert("_dthhmm", t.format("%H:%M").to_string());
    ctx.insert("_dthhmmss", t.format("%H:%M:%S").to_string());

    ctx
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
