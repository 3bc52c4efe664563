//! Anomaly detection: rolling baselines and the z-score spike rule.

pub mod baseline;
pub mod rules;

pub use self::baseline::{compute_baseline, Baseline};
pub use self::rules::{detect_status_anomalies, RuleConfig};

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which breakdown of the minute a signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Status,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Status => write!(f, "status"),
        }
    }
}

/// A detected volume spike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySignal {
    pub timestamp: NaiveDateTime,
    pub dimension: Dimension,
    /// Label within the dimension, e.g. `failed`.
    pub key: String,
    pub current_value: u64,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub z_score: f64,
    pub reason: String,
}
