//! Alert sinks: where detected anomaly signals go.
//!
//! The monitor hands each sink the full list of signals for a minute in a
//! single call, and only when that list is non-empty.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::detect::AnomalySignal;

#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn dispatch(&self, signals: &[AnomalySignal]) -> Result<()>;
}

/// Which built-in sink to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Human-readable alert blocks on stdout.
    #[default]
    Console,
    /// Structured `tracing` events.
    Log,
    /// One JSON object per signal on stdout.
    Json,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => write!(f, "console"),
            SinkKind::Log => write!(f, "log"),
            SinkKind::Json => write!(f, "json"),
        }
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(SinkKind::Console),
            "log" => Ok(SinkKind::Log),
            "json" => Ok(SinkKind::Json),
            other => Err(format!("unknown alert sink '{other}', expected console, log or json")),
        }
    }
}

/// Build the sink selected by `kind`.
pub fn build_sink(kind: SinkKind) -> Box<dyn AlertSink> {
    match kind {
        SinkKind::Console => Box::new(ConsoleAlertSink),
        SinkKind::Log => Box::new(TracingAlertSink),
        SinkKind::Json => Box::new(JsonAlertSink),
    }
}

/// Format one signal as an operator-facing alert block.
pub fn format_alert(signal: &AnomalySignal) -> String {
    format!(
        "\n🚨 ALERT DETECTED 🚨\n\
         Time: {}\n\
         Dimension: {}\n\
         Key: {}\n\
         Current Value: {}\n\
         Baseline Mean: {:.2}\n\
         Baseline Std: {:.2}\n\
         Z-Score: {:.2}\n\
         Reason: {}\n\
         ----------------------------------------------",
        signal.timestamp,
        signal.dimension,
        signal.key,
        signal.current_value,
        signal.baseline_mean,
        signal.baseline_std,
        signal.z_score,
        signal.reason,
    )
}

#[derive(Debug, Default)]
pub struct ConsoleAlertSink;

#[async_trait::async_trait]
impl AlertSink for ConsoleAlertSink {
    async fn dispatch(&self, signals: &[AnomalySignal]) -> Result<()> {
        println!("⚠️  {} anomaly signal(s) detected!", signals.len());
        for signal in signals {
            println!("{}", format_alert(signal));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TracingAlertSink;

#[async_trait::async_trait]
impl AlertSink for TracingAlertSink {
    async fn dispatch(&self, signals: &[AnomalySignal]) -> Result<()> {
        for s in signals {
            warn!(
                timestamp = %s.timestamp,
                dimension = %s.dimension,
                key = %s.key,
                current = s.current_value,
                mean = s.baseline_mean,
                std = s.baseline_std,
                z_score = s.z_score,
                "{}",
                s.reason
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct JsonAlertSink;

#[async_trait::async_trait]
impl AlertSink for JsonAlertSink {
    async fn dispatch(&self, signals: &[AnomalySignal]) -> Result<()> {
        for signal in signals {
            println!("{}", serde_json::to_string(signal)?);
        }
        Ok(())
    }
}
