//! txpulse -- real-time volume spike monitoring for payment transaction streams.
//!
//! This crate provides the sliding-window state, the rolling z-score rule
//! engine, and the collaborators that feed it (CSV ingestion) and consume
//! its output (alert sinks and the snapshot log).

pub mod alert;
pub mod config;
pub mod detect;
pub mod engine;
pub mod ingest;
pub mod snapshot;
pub mod window;

use std::future::Future;

use anyhow::{Context, Result};

use crate::config::MonitorConfig;
use crate::engine::{Monitor, RunSummary};

/// Run the monitor over the configured exports until they are exhausted or
/// `shutdown` resolves.
pub async fn run<F>(config: &MonitorConfig, shutdown: F) -> Result<RunSummary>
where
    F: Future<Output = ()>,
{
    // 1. Fail fast on bad settings
    config.validate().context("invalid configuration")?;
    let state = window::WindowState::new(config.window.size)?;

    tracing::info!(
        window = config.window.size,
        tick_ms = config.pacing.tick_ms,
        sink = %config.alerts.sink,
        "monitoring service starting"
    );

    // 2. Load and merge the input tables
    let buckets = ingest::minute_stream(&config.input.transactions_csv, &config.input.auth_codes_csv)?;

    // 3. Wire publishers and the alert sink
    let snapshot_log = snapshot::JsonlSnapshotLog::open(config.snapshot.log_path.clone()).await?;
    let mut monitor = Monitor::new(state, config.rules.clone(), alert::build_sink(config.alerts.sink))
        .with_publisher(Box::new(snapshot_log));
    if config.snapshot.console {
        monitor = monitor.with_publisher(Box::new(snapshot::ConsoleSnapshotPublisher));
    }

    // 4. Drive the cycles
    Ok(monitor.run(buckets, config.pacing.tick(), shutdown).await)
}
