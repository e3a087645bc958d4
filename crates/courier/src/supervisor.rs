//! Supervisor
//!
//! Owns the lifecycles of every engine component. Startup order: service
//! registry → dispatch queues and workers → periodic scheduler → broker
//! connection (subscriptions last, on the `Connected` event). Shutdown runs
//! in reverse, draining dispatch queues up to the configured grace period.

use std::sync::Arc;
use std::time::Duration;

use courier_broker::{Broker, BrokerEvent, MqttBroker};
use courier_config::{Config, RouteConfig, TargetsSpec};
use courier_cron::{Scheduler, TaskSpec};
use courier_dispatch::{DispatchEngine, DispatchOptions, DispatchSnapshot};
use courier_protocol::{Message, Target};
use courier_services::{PluginSet, ServiceRegistry};
use courier_transform::{HelperRegistry, Pipeline, PipelineSettings, RouteTable, resolve_address};
use thiserror::Error;
use tokio::sync::mpsc;

/// Why the daemon could not come up
#[derive(Debug, Error)]
pub enum StartError {
    /// Malformed or inconsistent configuration (exit code 1)
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration is sound but a component failed to start
    /// (exit code 2)
    #[error("startup failure: {0}")]
    Runtime(String),
}

impl StartError {
    /// The process exit code this failure maps to
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Runtime(_) => 2,
        }
    }
}

/// Matching, transformation and enqueueing for one message
///
/// Shared between the supervisor's event loop and the cron forwarder task.
struct Core {
    table: RouteTable,
    pipeline: Pipeline,
    engine: Arc<DispatchEngine>,
}

impl Core {
    fn ingest(&self, msg: &Message) -> usize {
        let routes = self.table.matches(&msg.topic);
        if routes.is_empty() {
            tracing::trace!(topic = %msg.topic, "no matching routes");
            return 0;
        }

        let mut enqueued = 0;
        for route in routes {
            for job in self.pipeline.process(route, msg) {
                if self.engine.enqueue(job) {
                    enqueued += 1;
                }
            }
        }
        enqueued
    }
}

/// The assembled engine
pub struct Supervisor {
    core: Arc<Core>,
    scheduler: Option<Scheduler>,
    broker: Arc<dyn Broker>,
    broker_rx: mpsc::Receiver<BrokerEvent>,
    lwt_topic: Option<String>,
    grace_period: Duration,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Assemble the engine against a live MQTT connection
    pub async fn start(
        config: Config,
        helpers: HelperRegistry,
        plugins: PluginSet,
    ) -> Result<Self, StartError> {
        let (broker, broker_rx) = MqttBroker::connect(&config.broker);
        Self::build(config, helpers, plugins, Arc::new(broker), broker_rx).await
    }

    /// Assemble the engine against any broker implementation
    ///
    /// Split out from [`Supervisor::start`] so tests can drive the event
    /// stream themselves.
    pub async fn build(
        config: Config,
        helpers: HelperRegistry,
        plugins: PluginSet,
        broker: Arc<dyn Broker>,
        broker_rx: mpsc::Receiver<BrokerEvent>,
    ) -> Result<Self, StartError> {
        let defaults = &config.defaults;

        // Registry first: everything else validates against it.
        let registry = Arc::new(
            ServiceRegistry::build(
                &config.services,
                &plugins,
                Duration::from_secs(defaults.deliver_timeout_secs),
            )
            .map_err(|e| StartError::Config(e.to_string()))?,
        );
        registry
            .init_all()
            .await
            .map_err(|e| StartError::Runtime(e.to_string()))?;

        // Routes, including the synthetic ones periodic tasks declare.
        let mut route_configs = config.routes.clone();
        for task in &config.cron {
            if let (Some(topic), Some(targets)) = (&task.topic, &task.targets) {
                route_configs.push(cron_route(&task.name, topic, targets.clone()));
            }
        }

        let table =
            RouteTable::compile(&route_configs, &helpers, registry.as_ref(), defaults.strict)
                .map_err(|e| StartError::Config(e.to_string()))?;
        if table.is_empty() {
            tracing::warn!("no routes configured; incoming messages will be dropped");
        }

        // The failover pseudo-route is evaluated statically, right now.
        let mut failover_targets: Vec<Target> = Vec::new();
        for entry in &config.failover.targets {
            let resolved = resolve_address("failover", entry, registry.as_ref());
            if resolved.is_empty() && defaults.strict {
                return Err(StartError::Config(format!(
                    "failover references unknown target '{entry}'"
                )));
            }
            failover_targets.extend(resolved);
        }

        let engine = Arc::new(DispatchEngine::start(
            Arc::clone(&registry),
            failover_targets,
            DispatchOptions {
                queue_capacity: defaults.queue_capacity,
                retry_backoff: Duration::from_millis(defaults.retry_backoff_ms),
            },
        ));

        let pipeline = Pipeline::new(
            registry,
            PipelineSettings {
                skip_retained: defaults.skip_retained,
                strict_format: defaults.strict_format,
                retry_limit: defaults.retry_limit,
            },
        );

        let core = Arc::new(Core {
            table,
            pipeline,
            engine: Arc::clone(&engine),
        });

        // Scheduler after the dispatch path is ready to receive its jobs.
        // Its results re-enter the pipeline through a forwarder task, just
        // like broker deliveries.
        let (cron_tx, mut cron_rx) = mpsc::channel::<Message>(64);
        {
            let core = Arc::clone(&core);
            tokio::spawn(async move {
                while let Some(msg) = cron_rx.recv().await {
                    core.ingest(&msg);
                }
            });
        }

        let scheduler = if config.cron.is_empty() {
            None
        } else {
            let mut tasks = Vec::with_capacity(config.cron.len());
            for task in &config.cron {
                let func = helpers.cron(&task.function).ok_or_else(|| {
                    StartError::Config(format!(
                        "cron task '{}' references unknown helper '{}'",
                        task.name, task.function
                    ))
                })?;
                tasks.push(TaskSpec {
                    name: task.name.clone(),
                    func: func.clone(),
                    interval: Duration::from_secs_f64(task.interval),
                    run_immediately: task.now,
                    topic: task.topic.clone(),
                });
            }
            Some(Scheduler::start(tasks, cron_tx))
        };

        tracing::info!(
            routes = core.table.len(),
            queues = engine.queue_count(),
            cron_tasks = config.cron.len(),
            "engine assembled"
        );

        Ok(Self {
            core,
            scheduler,
            broker,
            broker_rx,
            lwt_topic: config.broker.lwt_topic.clone(),
            grace_period: Duration::from_secs(defaults.grace_period_secs),
        })
    }

    /// Run one message through matching and transformation
    ///
    /// Returns the number of jobs enqueued.
    pub fn ingest(&self, msg: &Message) -> usize {
        self.core.ingest(msg)
    }

    /// React to one broker event
    pub async fn handle_event(&self, event: BrokerEvent) {
        match event {
            BrokerEvent::Connected { session_present } => {
                tracing::info!(session_present, "broker connected, asserting subscriptions");
                for (pattern, qos) in self.core.table.subscriptions() {
                    if let Err(e) = self.broker.subscribe(&pattern, qos).await {
                        tracing::error!(pattern = %pattern, error = %e, "subscribe failed");
                    }
                }
                if let Some(lwt) = &self.lwt_topic {
                    let _ = self
                        .broker
                        .publish(lwt, courier_broker::LWT_ALIVE.as_bytes(), 0, true)
                        .await;
                }
            }

            BrokerEvent::Disconnected { reason } => {
                self.core.engine.notify_failover(
                    "brokerdisconnected",
                    &format!("Broker connection lost ({reason}); reconnecting with back-off"),
                );
            }

            BrokerEvent::Message(msg) => {
                tracing::debug!(topic = %msg.topic, bytes = msg.payload.len(), "message received");
                self.ingest(&msg);
            }
        }
    }

    /// Snapshot of the dispatch counters
    pub fn dispatch_metrics(&self) -> DispatchSnapshot {
        self.core.engine.metrics()
    }

    /// Number of compiled routes
    pub fn route_count(&self) -> usize {
        self.core.table.len()
    }

    /// Drive the engine until a termination signal arrives or the broker
    /// event stream ends
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("termination signal received");
                    break;
                }
                event = self.broker_rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::info!("broker event stream ended");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
    }

    /// Tear the engine down in reverse startup order
    pub async fn shutdown(&self) {
        tracing::info!("shutting down");

        // Broker first: stop new ingest, leave a clean LWT behind.
        if let Some(lwt) = &self.lwt_topic {
            let _ = self
                .broker
                .publish(lwt, courier_broker::LWT_DEAD.as_bytes(), 0, true)
                .await;
        }
        if let Err(e) = self.broker.disconnect().await {
            tracing::debug!(error = %e, "broker disconnect failed");
        }

        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown().await;
        }

        self.core.engine.shutdown(self.grace_period).await;
        tracing::info!("shutdown complete");
    }
}

/// The synthetic route a periodic task with a direct target list gets
fn cron_route(name: &str, topic: &str, targets: Vec<String>) -> RouteConfig {
    RouteConfig {
        name: Some(format!("cron/{name}")),
        topic: topic.to_string(),
        targets: TargetsSpec::Static(targets),
        filter: None,
        datamap: None,
        alldata: None,
        format: None,
        title: None,
        priority: None,
        retry: None,
        qos: None,
        ignore_retained: None,
    }
}
