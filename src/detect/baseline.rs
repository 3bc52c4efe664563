use serde::{Deserialize, Serialize};

/// Rolling baseline of a per-minute series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Baseline {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: usize,
}

impl Baseline {
    /// Z = (value - mean) / std_dev. Callers must rule out a zero std_dev.
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    pub fn is_degenerate(&self) -> bool {
        self.std_dev == 0.0 || self.mean == 0.0
    }
}

/// Mean and sample standard deviation (n - 1 divisor) of `series`.
///
/// Empty series give (0, 0). A single point has no spread, so its std_dev
/// is 0.
pub fn compute_baseline(series: &[u64]) -> Baseline {
    if series.is_empty() {
        return Baseline::default();
    }

    let count = series.len();
    let mean = series.iter().map(|&v| v as f64).sum::<f64>() / count as f64;

    if count == 1 {
        return Baseline {
            mean,
            std_dev: 0.0,
            sample_count: 1,
        };
    }

    let variance_sum: f64 = series
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum();
    let variance = variance_sum / (count - 1) as f64;

    Baseline {
        mean,
        std_dev: variance.sqrt(),
        sample_count: count,
    }
}
