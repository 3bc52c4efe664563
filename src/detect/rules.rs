use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detect::baseline::compute_baseline;
use crate::detect::{AnomalySignal, Dimension};
use crate::window::{Bucket, Status, WindowState};

/// Tunables for the status spike rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Statuses evaluated each minute, in output order.
    pub watched_statuses: Vec<Status>,
    /// Minimum number of minutes in the window before a baseline is trusted.
    pub min_history: usize,
    /// A signal fires only when the z-score is strictly above this.
    pub z_threshold: f64,
    /// Minutes below this absolute count never fire.
    pub min_count: u64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            watched_statuses: Status::DEFAULT_WATCHED.to_vec(),
            min_history: 10,
            z_threshold: 3.0,
            min_count: 5,
        }
    }
}

/// Flag upward spikes of the watched statuses in `latest`.
///
/// `latest` is expected to already be part of `state`, so its own count is
/// inside the baseline it is compared against. Only spikes are reported,
/// never dips. Signals come back in `watched_statuses` order.
pub fn detect_status_anomalies(
    state: &WindowState,
    latest: &Bucket,
    rules: &RuleConfig,
) -> Vec<AnomalySignal> {
    let mut signals = Vec::new();

    for status in &rules.watched_statuses {
        let series = state.status_series(status);
        if series.len() < rules.min_history {
            debug!(%status, have = series.len(), needed = rules.min_history, "not enough history");
            continue;
        }

        let baseline = compute_baseline(&series);
        if baseline.is_degenerate() {
            debug!(%status, mean = baseline.mean, std = baseline.std_dev, "flat baseline, skipping");
            continue;
        }

        let current_value = latest.status_count(status);
        if current_value < rules.min_count {
            continue;
        }

        let z = baseline.z_score(current_value as f64);
        if z > rules.z_threshold {
            signals.push(AnomalySignal {
                timestamp: latest.timestamp(),
                dimension: Dimension::Status,
                key: status.to_string(),
                current_value,
                baseline_mean: baseline.mean,
                baseline_std: baseline.std_dev,
                z_score: z,
                reason: format!(
                    "{} spiked: {} vs baseline mean={:.2}, std={:.2}, z={:.2}",
                    status, current_value, baseline.mean, baseline.std_dev, z
                ),
            });
        }
    }

    signals
}
