//! Courier - MQTT notification router
//!
//! # Usage
//!
//! ```bash
//! # Run the daemon (default)
//! courier
//! courier --config /etc/courier/courier.toml
//!
//! # Print a starter configuration / helpers file
//! courier make-config > courier.toml
//! courier make-helpers > helpers.rs
//!
//! # Invoke one notifier directly, bypassing routing
//! courier plugin --service log --target info --data '{"message": "hello"}'
//! ```
//!
//! Exit codes: 0 success, 1 configuration error, 2 runtime startup failure.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use courier_config::{Config, LogFormat};
use courier_protocol::{Job, Target, TransformContext};
use courier_services::{PluginSet, ServiceRegistry};
use courier_transform::HelperRegistry;
use tracing_subscriber::EnvFilter;

use courier::samples;
use courier::supervisor::{StartError, Supervisor};

/// Courier - MQTT notification router
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, default_value = "courier.toml", global = true)]
    config: std::path::PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the routing daemon (default)
    Serve,

    /// Print a sample configuration file to stdout
    MakeConfig,

    /// Print a sample helpers source file to stdout
    MakeHelpers,

    /// Invoke one service plugin directly, bypassing routing
    Plugin {
        /// Service instance to invoke
        #[arg(long)]
        service: String,

        /// Target within the service (defaults to its first declared target)
        #[arg(long)]
        target: Option<String>,

        /// JSON document; `message` and `title` feed the job, the rest
        /// becomes its context
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();

    match cli.command.take() {
        Some(Command::MakeConfig) => {
            print!("{}", samples::SAMPLE_CONFIG);
            ExitCode::SUCCESS
        }
        Some(Command::MakeHelpers) => {
            print!("{}", samples::SAMPLE_HELPERS);
            ExitCode::SUCCESS
        }
        Some(Command::Plugin {
            service,
            target,
            data,
        }) => run_plugin(&cli, &service, target.as_deref(), &data).await,
        Some(Command::Serve) | None => serve(&cli).await,
    }
}

async fn serve(cli: &Cli) -> ExitCode {
    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("courier: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_logging(&config, cli.log_level.as_deref()) {
        eprintln!("courier: cannot initialize logging: {e}");
        return ExitCode::from(2);
    }

    tracing::info!(
        version = courier_protocol::VERSION,
        config = %cli.config.display(),
        "starting courier"
    );

    // Helpers are compiled in. This binary ships none; fork it and
    // register your own (see `courier make-helpers`).
    let helpers = HelperRegistry::new();
    let plugins = PluginSet::builtin();

    match Supervisor::start(config, helpers, plugins).await {
        Ok(supervisor) => {
            supervisor.run().await;
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot start");
            eprintln!("courier: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Run one notifier directly with a hand-built job
async fn run_plugin(cli: &Cli, service: &str, target: Option<&str>, data: &str) -> ExitCode {
    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("courier: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_logging(&config, cli.log_level.as_deref().or(Some("debug"))) {
        eprintln!("courier: cannot initialize logging: {e}");
        return ExitCode::from(2);
    }

    let document: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("courier: invalid --data JSON: {e}");
            return ExitCode::from(1);
        }
    };

    let registry = match ServiceRegistry::build(
        &config.services,
        &PluginSet::builtin(),
        Duration::from_secs(config.defaults.deliver_timeout_secs),
    ) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("courier: {e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = registry.init_all().await {
        eprintln!("courier: {e}");
        return ExitCode::from(2);
    }

    let target_name = match target
        .map(str::to_string)
        .or_else(|| first_target(&config, service))
    {
        Some(name) => name,
        None => {
            eprintln!("courier: service '{service}' declares no targets");
            return ExitCode::from(1);
        }
    };

    let body = document
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("courier plugin test")
        .to_string();
    let title = document
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let mut context = TransformContext::new();
    if let serde_json::Value::Object(map) = document {
        context.merge(map);
    }

    let job = Job {
        target: Target::new(service, target_name),
        title,
        body: body.clone(),
        context,
        topic: "courier/plugin".into(),
        payload: bytes::Bytes::from(body),
        priority: 0,
        attempt: 0,
        retry_limit: 0,
        failover: false,
    };

    match registry.dispatch(&job).await {
        Ok(true) => {
            tracing::info!(target = %job.target, "plugin reported success");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            tracing::warn!(target = %job.target, "plugin reported failure");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(target = %job.target, error = %e, "plugin invocation failed");
            ExitCode::from(2)
        }
    }
}

fn first_target(config: &Config, service: &str) -> Option<String> {
    config
        .services
        .get(service)?
        .target_names()
        .next()
        .map(str::to_string)
}

/// Initialize the tracing subscriber from configuration plus CLI override
fn init_logging(config: &Config, override_level: Option<&str>) -> anyhow::Result<()> {
    let level = override_level.unwrap_or(config.log.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    match (&config.log.file, config.log.format) {
        (Some(path), format) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false);
            match format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Console => builder.init(),
            }
        }
        (None, format) => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            match format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Console => builder.init(),
            }
        }
    }

    Ok(())
}

// The StartError → exit-code mapping is part of the CLI contract.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_error_exit_codes() {
        assert_eq!(StartError::Config("x".into()).exit_code(), 1);
        assert_eq!(StartError::Runtime("x".into()).exit_code(), 2);
    }
}
