//! Per-cycle snapshots of the window for external dashboards.

mod log;

pub use self::log::{read_snapshots, JsonlSnapshotLog};

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::window::{Status, WindowState};

/// Headline counts of the most recent minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub approved: u64,
    pub failed: u64,
    pub denied: u64,
    pub reversed: u64,
}

impl Snapshot {
    /// `None` while the window is still empty.
    pub fn from_state(state: &WindowState) -> Option<Self> {
        let latest = state.latest_bucket()?;
        Some(Self {
            timestamp: latest.timestamp(),
            approved: latest.status_count(&Status::Approved),
            failed: latest.status_count(&Status::Failed),
            denied: latest.status_count(&Status::Denied),
            reversed: latest.status_count(&Status::Reversed),
        })
    }
}

/// Terminal mini-dashboard for the latest minute.
pub fn render_text(state: &WindowState) -> String {
    let Some(snap) = Snapshot::from_state(state) else {
        return "No data in window yet.".to_string();
    };

    [
        "========= SNAPSHOT =========".to_string(),
        format!("Window Size    : {} minutes", state.window_size()),
        format!("Latest Minute  : {}", snap.timestamp),
        String::new(),
        format!("Approved       : {}", snap.approved),
        format!("Failed         : {}", snap.failed),
        format!("Denied         : {}", snap.denied),
        format!("Reversed       : {}", snap.reversed),
        "============================".to_string(),
    ]
    .join("\n")
}

/// Receives the window once per monitoring cycle.
#[async_trait::async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(&self, state: &WindowState) -> Result<()>;
}

/// Prints the text dashboard to stderr, leaving stdout to the alert sinks.
#[derive(Debug, Default)]
pub struct ConsoleSnapshotPublisher;

#[async_trait::async_trait]
impl SnapshotPublisher for ConsoleSnapshotPublisher {
    async fn publish(&self, state: &WindowState) -> Result<()> {
        eprintln!("{}", render_text(state));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Bucket;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_window_renders_placeholder() {
        let state = WindowState::new(30).unwrap();
        assert!(Snapshot::from_state(&state).is_none());
        assert_eq!(render_text(&state), "No data in window yet.");
    }

    #[test]
    fn test_snapshot_reads_latest_bucket() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        let mut state = WindowState::new(30).unwrap();
        state.add_bucket(Bucket::empty(ts).with_status_count(Status::Failed, 99));
        state.add_bucket(
            Bucket::empty(ts + chrono::Duration::minutes(1))
                .with_status_count(Status::Approved, 120)
                .with_status_count(Status::Failed, 8)
                .with_status_count(Status::Other("backend_reversed".into()), 4),
        );

        let snap = Snapshot::from_state(&state).unwrap();
        assert_eq!(snap.approved, 120);
        assert_eq!(snap.failed, 8);
        assert_eq!(snap.denied, 0);
        assert_eq!(snap.reversed, 0);

        let text = render_text(&state);
        assert!(text.contains("Window Size    : 30 minutes"));
        assert!(text.contains("Latest Minute  : 2024-01-01 10:06:00"));
        assert!(text.contains("Approved       : 120"));
        assert!(text.contains("Failed         : 8"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        let snap = Snapshot {
            timestamp: ts,
            approved: 1,
            failed: 2,
            denied: 3,
            reversed: 4,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2024-01-01T10:05:00","approved":1,"failed":2,"denied":3,"reversed":4}"#
        );
    }
}
