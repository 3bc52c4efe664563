//! Append-only JSON-lines snapshot store.
//!
//! Each cycle appends one self-contained JSON object per line so that a
//! dashboard can tail the file while the monitor is still writing it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Snapshot, SnapshotPublisher};
use crate::window::WindowState;

/// Snapshot publisher backed by a JSON-lines file opened in append mode.
pub struct JsonlSnapshotLog {
    path: PathBuf,
    writer: Mutex<tokio::fs::File>,
}

impl JsonlSnapshotLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create snapshot directory: {}", parent.display()))?;
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open snapshot log: {}", path.display()))?;

        debug!(path = %path.display(), "snapshot log opened");

        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    pub async fn append(&self, snapshot: &Snapshot) -> Result<()> {
        let mut line = serde_json::to_string(snapshot).context("failed to serialize snapshot")?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to write snapshot log: {}", self.path.display()))?;
        writer
            .flush()
            .await
            .with_context(|| format!("failed to flush snapshot log: {}", self.path.display()))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SnapshotPublisher for JsonlSnapshotLog {
    async fn publish(&self, state: &WindowState) -> Result<()> {
        match Snapshot::from_state(state) {
            Some(snapshot) => self.append(&snapshot).await,
            None => Ok(()),
        }
    }
}

/// Read every parseable snapshot from `path`, oldest first.
///
/// Blank lines, lines that are not valid UTF-8 and lines that do not
/// parse as a snapshot are skipped. When several records share a
/// minute, the first one in file order wins. A missing file reads as empty.
pub async fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read snapshot log: {}", path.display()))
        }
    };

    let mut snapshots: Vec<Snapshot> = Vec::new();
    let mut skipped = 0usize;
    for raw in content.split(|&b| b == b'\n') {
        let Ok(line) = std::str::from_utf8(raw) else {
            skipped += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(snap) => snapshots.push(snap),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "ignored malformed snapshot lines");
    }

    snapshots.sort_by_key(|s| s.timestamp);
    snapshots.dedup_by_key(|s| s.timestamp);
    Ok(snapshots)
}
