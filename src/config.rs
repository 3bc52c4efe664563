//! TOML configuration for the txpulse monitor.
//!
//! Every setting has a compiled-in default and can be overridden by a
//! config file; the CLI then overrides individual values on top of that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::alert::SinkKind;
use crate::detect::RuleConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TXPULSE_CONFIG";

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG: &str = "txpulse.toml";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window.size must be a positive number of minutes, got {0}")]
    WindowSize(usize),
    #[error("rules.z_threshold must be a finite, non-negative number, got {0}")]
    ZThreshold(f64),
    #[error("rules.watched_statuses must name at least one status")]
    NoWatchedStatuses,
    #[error("rules.watched_statuses contains unknown status '{0}' (known: approved, failed, denied, reversed)")]
    UnknownStatus(String),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for a monitoring run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// The config file to use when none is given explicitly: `$TXPULSE_CONFIG`
    /// when set, otherwise `./txpulse.toml` when it exists.
    pub fn locate() -> Option<PathBuf> {
        if let Some(env_path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(env_path));
        }
        let local = Path::new(LOCAL_CONFIG);
        local.exists().then(|| local.to_path_buf())
    }

    /// Load the file picked by [`MonitorConfig::locate`], or the compiled-in
    /// defaults when there is none. A located file that cannot be read or
    /// parsed is an error.
    pub fn load_or_default() -> Result<(Self, Option<PathBuf>)> {
        match Self::locate() {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Reject settings the monitor cannot start with.
    ///
    /// A window smaller than `min_history` is accepted: detection simply
    /// never activates. That is logged as a warning, not refused.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.size == 0 {
            return Err(ConfigError::WindowSize(self.window.size));
        }
        if !self.rules.z_threshold.is_finite() || self.rules.z_threshold < 0.0 {
            return Err(ConfigError::ZThreshold(self.rules.z_threshold));
        }
        if self.rules.watched_statuses.is_empty() {
            return Err(ConfigError::NoWatchedStatuses);
        }
        if let Some(unknown) = self.rules.watched_statuses.iter().find(|s| !s.is_known()) {
            return Err(ConfigError::UnknownStatus(unknown.to_string()));
        }

        if self.window.size < self.rules.min_history {
            warn!(
                window = self.window.size,
                min_history = self.rules.min_history,
                "window is smaller than min_history, no anomaly will ever be raised"
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Locations of the two aggregate exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Per-minute status counts (`timestamp,status,count`).
    pub transactions_csv: PathBuf,
    /// Per-minute authorization-code counts (`timestamp,auth_code,count`).
    pub auth_codes_csv: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            transactions_csv: PathBuf::from("data/transactions.csv"),
            auth_codes_csv: PathBuf::from("data/transactions_auth_codes.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Minutes retained for the baseline.
    pub size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { size: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Wall-clock pause between simulated minutes, in milliseconds.
    pub tick_ms: u64,
}

impl PacingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { tick_ms: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Append-only JSON-lines file read by dashboards.
    pub log_path: PathBuf,
    /// Also print the text dashboard each minute.
    pub console: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("data/monitor_snapshots.jsonl"),
            console: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub sink: SinkKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
