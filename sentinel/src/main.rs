//! Model Sentinel Main Binary
//!
//! - `serve`: HTTP inference with non-blocking audit logging (default)
//! - `baseline`: build and persist the baseline frequency table
//! - `drift`: compare recent audit records against the baseline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ml_sentinel_api::prelude::*;
use ml_sentinel_core::{config::Config, schema::FeatureSchema};
use ml_sentinel_detection::prelude::*;
use ml_sentinel_inference::artifacts::load_encoder;
use ml_sentinel_inference::encoder::FeatureEncoder;
use ml_sentinel_storage::baseline::BaselineStore;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Model Sentinel CLI arguments
#[derive(Debug, Parser)]
#[clap(
    name = "sentinel",
    version,
    about = "Model serving with audit logging and categorical drift monitoring"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[clap(long, env = "SENTINEL_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[clap(long, env = "SENTINEL_LOG_JSON", global = true)]
    log_json: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the inference API (default if no subcommand given)
    Serve,
    /// Build the baseline frequency table from training rows
    Baseline {
        /// Newline-delimited JSON training rows (defaults to the built-in sample)
        #[clap(long)]
        training_data: Option<PathBuf>,

        /// Categorical keys to track (defaults to the schema's drift keys)
        #[clap(long, value_delimiter = ',', num_args = 1..)]
        keys: Vec<String>,

        /// Where to write the baseline (defaults to BASELINE_PATH)
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Check recent traffic for categorical drift
    Drift {
        /// Alert threshold (defaults to DRIFT_THRESHOLD)
        #[clap(long)]
        threshold: Option<f64>,

        /// Number of recent audit records to inspect (defaults to DRIFT_WINDOW)
        #[clap(long)]
        window: Option<usize>,

        /// Print the full report as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Some(Commands::Baseline {
            training_data,
            keys,
            output,
        }) => run_baseline_command(&config, training_data, keys, output),
        Some(Commands::Drift {
            threshold,
            window,
            json,
        }) => run_drift_command(&config, threshold, window, json),
        Some(Commands::Serve) | None => run_serve_command(config).await,
    }
}

/// Run the serve subcommand (default behavior)
async fn run_serve_command(config: Config) -> Result<()> {
    info!("Starting Model Sentinel v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server bind address")?;

    let (context, _audit_task) = ServingContext::from_config(&config, env!("CARGO_PKG_VERSION"))
        .context("Failed to load serving artifacts")?;
    let context = Arc::new(context);

    let api_config = ApiConfig {
        bind_addr: addr,
        timeout_secs: config.server.request_timeout_secs,
        ..ApiConfig::default()
    };

    ApiServer::new(api_config, context.clone())
        .serve_with_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Flushing audit log");
    if let Err(e) = context.audit().flush().await {
        warn!(error = %e, "Audit log flush failed during shutdown");
    }

    info!("Model Sentinel shut down gracefully");
    Ok(())
}

/// Run the baseline subcommand
fn run_baseline_command(
    config: &Config,
    training_data: Option<PathBuf>,
    keys: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let rows = match training_data {
        Some(path) => load_training_rows(&path)
            .with_context(|| format!("Failed to read training data from {}", path.display()))?,
        None => {
            info!("Using built-in sample training rows");
            sample_rows()
        }
    };

    let schema = match load_encoder(&config.artifacts.encoder_path) {
        Ok((encoder, _)) => encoder.schema().clone(),
        Err(e) => {
            warn!(error = %e, "Encoder artifact unavailable, using the adult-census schema");
            FeatureSchema::adult_census()
        }
    };

    let store = BaselineStore::new(output.unwrap_or_else(|| config.drift.baseline_path.clone()));
    let mut builder = BaselineBuilder::for_schema(&schema, store);
    if !keys.is_empty() {
        builder = builder.with_keys(keys);
    }

    info!(keys = ?builder.keys(), rows = rows.len(), "Building baseline");
    builder
        .build_and_save(&rows)
        .context("Failed to build baseline")?;

    println!("Saved baseline to {}", builder.store().path().display());
    Ok(())
}

/// Run the drift subcommand
fn run_drift_command(
    config: &Config,
    threshold: Option<f64>,
    window: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut job = DriftJob::from_config(config).context("Invalid drift configuration")?;
    if let Some(threshold) = threshold {
        job = job.with_threshold(threshold)?;
    }
    if let Some(window) = window {
        job = job.with_window(window)?;
    }

    let outcome = job.run().context("Drift job failed")?;

    if json {
        let value = match outcome.report() {
            Some(report) => serde_json::to_value(report)?,
            None => serde_json::json!({
                "status": "no_baseline",
                "detail": outcome.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{outcome}");
    }
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, shutting down..."); },
        _ = terminate => { info!("Received SIGTERM, shutting down..."); },
    }
}

/// Initialize logging based on CLI arguments
///
/// Logs go to stderr so that `baseline` and `drift` output on stdout stays
/// machine-readable.
fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .context("Invalid log level")?;

    if cli.log_json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(log_level.into()),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .with(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(log_level.into()),
            )
            .init();
    }

    Ok(())
}
