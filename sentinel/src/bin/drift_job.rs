//! Standalone drift job, configured entirely through the environment.
//!
//! Intended for cron-style schedulers: compares the most recent `DRIFT_WINDOW`
//! audit records against the baseline at `BASELINE_PATH` and prints a single
//! line. A missing baseline or an empty audit log is reported, not raised.

use anyhow::{Context, Result};
use ml_sentinel_core::config::Config;
use ml_sentinel_detection::job::DriftJob;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let outcome = DriftJob::from_config(&config)
        .context("Invalid drift configuration")?
        .run()
        .context("Drift job failed")?;

    println!("{outcome}");
    Ok(())
}
