//! Ingestion of the per-minute aggregate exports.
//!
//! Two independent tables feed the monitor: status counts
//! (`timestamp,status,count`) and authorization-code counts
//! (`timestamp,auth_code,count`). Both are grouped by minute and merged into
//! one chronological stream of [`Bucket`]s.

mod table;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use futures::Stream;
use thiserror::Error;
use tracing::{info, warn};

use crate::window::{AuthCode, Bucket, Status};
use self::table::{parse_minute, Table};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is empty, expected a header row", .0.display())]
    Empty(PathBuf),
    #[error("{} has no `{column}` column", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
}

pub type StatusCounts = BTreeMap<NaiveDateTime, BTreeMap<Status, u64>>;
pub type AuthCodeCounts = BTreeMap<NaiveDateTime, BTreeMap<AuthCode, u64>>;

/// Load the status table grouped by minute.
///
/// Rows that fail to parse are skipped. A later row for the same minute and
/// status replaces an earlier one.
pub fn load_status_counts(path: &Path) -> Result<StatusCounts, IngestError> {
    let table = Table::read(path, &["timestamp", "status", "count"])?;
    let mut grouped = StatusCounts::new();
    let mut skipped = 0usize;

    for (line_no, fields) in table.records() {
        let parsed = fields.and_then(|f| {
            let ts = parse_minute(f[0])?;
            let status = Status::from(f[1]);
            let count = f[2].parse::<u64>().ok()?;
            (!status.as_str().is_empty()).then_some((ts, status, count))
        });
        match parsed {
            Some((ts, status, count)) => {
                grouped.entry(ts).or_default().insert(status, count);
            }
            None => {
                warn!(path = %path.display(), line = line_no, "skipping malformed status row");
                skipped += 1;
            }
        }
    }

    report(path, grouped.len(), skipped);
    Ok(grouped)
}

/// Load the authorization-code table grouped by minute.
pub fn load_auth_code_counts(path: &Path) -> Result<AuthCodeCounts, IngestError> {
    let table = Table::read(path, &["timestamp", "auth_code", "count"])?;
    let mut grouped = AuthCodeCounts::new();
    let mut skipped = 0usize;

    for (line_no, fields) in table.records() {
        let parsed = fields.and_then(|f| {
            let ts = parse_minute(f[0])?;
            let code = f[1].parse::<AuthCode>().ok()?;
            let count = f[2].parse::<u64>().ok()?;
            Some((ts, code, count))
        });
        match parsed {
            Some((ts, code, count)) => {
                grouped.entry(ts).or_default().insert(code, count);
            }
            None => {
                warn!(path = %path.display(), line = line_no, "skipping malformed auth code row");
                skipped += 1;
            }
        }
    }

    report(path, grouped.len(), skipped);
    Ok(grouped)
}

fn report(path: &Path, minutes: usize, skipped: usize) {
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "some rows could not be parsed");
    }
    info!(path = %path.display(), minutes, "loaded aggregate table");
}

/// One bucket per minute present in either table, oldest first. The side
/// that has nothing for a minute contributes empty counts.
pub fn merge_minutes(mut statuses: StatusCounts, mut auth_codes: AuthCodeCounts) -> Vec<Bucket> {
    let timeline: BTreeSet<NaiveDateTime> =
        statuses.keys().chain(auth_codes.keys()).copied().collect();

    timeline
        .into_iter()
        .map(|ts| {
            Bucket::new(
                ts,
                statuses.remove(&ts).unwrap_or_default(),
                auth_codes.remove(&ts).unwrap_or_default(),
            )
        })
        .collect()
}

/// Load both exports and expose them as a chronological bucket stream.
pub fn minute_stream(
    transactions_csv: &Path,
    auth_codes_csv: &Path,
) -> Result<impl Stream<Item = Bucket>, IngestError> {
    let statuses = load_status_counts(transactions_csv)?;
    let auth_codes = load_auth_code_counts(auth_codes_csv)?;
    Ok(futures::stream::iter(merge_minutes(statuses, auth_codes)))
}
