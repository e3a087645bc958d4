//! Sample files for `make-config` and `make-helpers`

/// A commented starter configuration
pub const SAMPLE_CONFIG: &str = r#"# courier sample configuration
#
# Start with: courier --config courier.toml

[broker]
host = "localhost"
port = 1883
client_id = "courier"
# username = "router"
# password = "secret"
# Publish "1" retained here while connected; the broker flips it to "0"
# if the connection dies.
# lwt_topic = "clients/courier"

[defaults]
# Drop retained messages unless a route opts back in.
skip_retained = false
# Per-target queue bound; the oldest job is dropped on overflow.
queue_capacity = 100
# Delivery retries before a job moves to the failover targets.
retry_limit = 0
# Seconds to wait for queues to drain at shutdown.
grace_period_secs = 5
# Reject (instead of skip) routes with unknown services/targets/helpers.
strict = false

[log]
level = "info"
format = "console"

# --- services ------------------------------------------------------------

[services.log]
[services.log.targets]
info = ["info"]
crit = ["crit"]

[services.file]
append_newline = true
[services.file.targets]
mylog = ["/tmp/courier.log"]

# [services.http]
# [services.http.targets]
# hook = ["https://example.org/hook"]

# --- routes (declaration order matters) ----------------------------------

[[routes]]
name = "hello"
topic = "hello/1"
targets = ["log:info"]
format = "{name}: {number}"

[[routes]]
topic = "test/dyn"
# A target template resolved per message from the decoded payload.
targets = "log:{loglevel}"

[[routes]]
topic = "sensors/+/temp"
targets = ["file:mylog"]
format = "{_topic[0]}: {payload}"

# --- failover ------------------------------------------------------------

[failover]
targets = ["log:crit"]

# --- periodic tasks ------------------------------------------------------

# [[cron]]
# name = "uptime"
# function = "publish_uptime"   # registered helper
# interval = 60.0
# now = true
# topic = "courier/uptime"
# targets = ["log:info"]
"#;

/// A starter helpers source file
///
/// Helpers are compiled in: fork the binary crate, register your functions
/// in `main`, and reference them by name from the configuration.
pub const SAMPLE_HELPERS: &str = r#"//! Sample courier helpers
//!
//! Configuration references helpers by name; this is where the names get
//! their meaning. Call `register(&mut helpers)` before Supervisor::start.

use std::sync::Arc;

use courier_transform::{HelperOutcome, HelperRegistry};

pub fn register(helpers: &mut HelperRegistry) {
    // filter = "ignore_heartbeats"  -- a truthy result drops the message
    helpers.register_filter(
        "ignore_heartbeats",
        Arc::new(|args| HelperOutcome::Keep(args.payload == b"ping")),
    );

    // datamap = "add_site"  -- merge extra values into the context
    helpers.register_datamap(
        "add_site",
        Arc::new(|topic, _ctx| {
            let mut map = serde_json::Map::new();
            map.insert("site".into(), topic.split('/').next().unwrap_or("").into());
            HelperOutcome::Keep(map)
        }),
    );

    // targets = { function = "by_severity" }  -- compute targets per message
    helpers.register_targets(
        "by_severity",
        Arc::new(|args| {
            let severe = args
                .context
                .get("severity")
                .and_then(|v| v.as_i64())
                .unwrap_or(0)
                >= 3;
            HelperOutcome::Keep(vec![if severe { "log:crit" } else { "log:info" }.into()])
        }),
    );

    // [[cron]] function = "publish_uptime"
    helpers.register_cron(
        "publish_uptime",
        Arc::new(|| HelperOutcome::Keep(b"alive".to_vec())),
    );
}
"#;
