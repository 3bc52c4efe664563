use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Numeric authorization code reported by the acquirer.
pub type AuthCode = u32;

/// Transaction status label.
///
/// The four labels the monitor knows about get their own variants. Anything
/// else coming off the wire is kept verbatim in [`Status::Other`] so it still
/// shows up in the window, it just can never be watched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Approved,
    Failed,
    Denied,
    Reversed,
    Other(String),
}

impl Status {
    /// The statuses evaluated by default. Approvals are left out on purpose:
    /// a surge of approvals is not an incident.
    pub const DEFAULT_WATCHED: [Status; 3] = [Status::Failed, Status::Denied, Status::Reversed];

    pub fn as_str(&self) -> &str {
        match self {
            Status::Approved => "approved",
            Status::Failed => "failed",
            Status::Denied => "denied",
            Status::Reversed => "reversed",
            Status::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Other(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Status {
    fn from(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "approved" => Status::Approved,
            "failed" => Status::Failed,
            "denied" => Status::Denied,
            "reversed" => Status::Reversed,
            _ => Status::Other(label),
        }
    }
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        Status::from(label.as_str())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

/// One minute of aggregated traffic.
///
/// Built once by the ingestion layer and never mutated afterwards; the
/// `with_*` setters consume `self` and are only meant for construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    timestamp: NaiveDateTime,
    status_counts: BTreeMap<Status, u64>,
    auth_code_counts: BTreeMap<AuthCode, u64>,
}

impl Bucket {
    pub fn new(
        timestamp: NaiveDateTime,
        status_counts: BTreeMap<Status, u64>,
        auth_code_counts: BTreeMap<AuthCode, u64>,
    ) -> Self {
        Self {
            timestamp,
            status_counts,
            auth_code_counts,
        }
    }

    /// A minute with no traffic recorded in either source.
    pub fn empty(timestamp: NaiveDateTime) -> Self {
        Self::new(timestamp, BTreeMap::new(), BTreeMap::new())
    }

    pub fn with_status_count(mut self, status: Status, count: u64) -> Self {
        self.status_counts.insert(status, count);
        self
    }

    pub fn with_auth_code_count(mut self, code: AuthCode, count: u64) -> Self {
        self.auth_code_counts.insert(code, count);
        self
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Count for `status` in this minute, 0 when the status was not reported.
    pub fn status_count(&self, status: &Status) -> u64 {
        self.status_counts.get(status).copied().unwrap_or(0)
    }

    /// Count for `code` in this minute, 0 when the code was not reported.
    pub fn auth_code_count(&self, code: AuthCode) -> u64 {
        self.auth_code_counts.get(&code).copied().unwrap_or(0)
    }

    pub fn status_counts(&self) -> &BTreeMap<Status, u64> {
        &self.status_counts
    }

    pub fn auth_code_counts(&self) -> &BTreeMap<AuthCode, u64> {
        &self.auth_code_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn minute(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, m, 0)
            .unwrap()
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(Status::from("FAILED"), Status::Failed);
        assert_eq!(Status::from(" Denied "), Status::Denied);
        assert_eq!(Status::from("chargeback"), Status::Other("chargeback".into()));
        assert!(!Status::from("chargeback").is_known());
    }

    #[test]
    fn test_status_serde_uses_plain_labels() {
        let json = serde_json::to_string(&Status::Reversed).unwrap();
        assert_eq!(json, "\"reversed\"");
        let parsed: Status = serde_json::from_str("\"backend_reversed\"").unwrap();
        assert_eq!(parsed, Status::Other("backend_reversed".into()));
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let bucket = Bucket::empty(minute(5))
            .with_status_count(Status::Approved, 120)
            .with_auth_code_count(0, 110);

        assert_eq!(bucket.status_count(&Status::Approved), 120);
        assert_eq!(bucket.status_count(&Status::Failed), 0);
        assert_eq!(bucket.auth_code_count(0), 110);
        assert_eq!(bucket.auth_code_count(1001), 0);
        assert_eq!(bucket.timestamp(), minute(5));
    }
}
