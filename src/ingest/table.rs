//! Minimal reader for the comma-separated aggregate exports.
//!
//! The exports are flat `timestamp,<key>,count` tables without quoting or
//! embedded commas, so rows are split on `,` after the header has been used
//! to locate the columns we need.

use std::path::Path;

use chrono::{NaiveDateTime, Timelike};

use super::IngestError;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A loaded table: raw rows plus the index of each requested column.
pub(crate) struct Table {
    columns: Vec<usize>,
    rows: Vec<(usize, Option<Vec<String>>)>,
}

impl Table {
    /// Read `path` and resolve `wanted` column names against its header.
    ///
    /// Rows are decoded one at a time; a row that is not valid UTF-8 is kept
    /// as an undecodable record instead of failing the whole file.
    pub(crate) fn read(path: &Path, wanted: &[&'static str]) -> Result<Self, IngestError> {
        let content = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut lines = content
            .split(|&b| b == b'\n')
            .enumerate()
            .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace));
        let header = match lines.next() {
            Some((_, line)) => split_row(&String::from_utf8_lossy(line)),
            None => return Err(IngestError::Empty(path.to_path_buf())),
        };

        let columns = wanted
            .iter()
            .map(|name| {
                header
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(name))
                    .ok_or_else(|| IngestError::MissingColumn {
                        path: path.to_path_buf(),
                        column: *name,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = lines
            .map(|(idx, line)| (idx + 1, std::str::from_utf8(line).ok().map(split_row)))
            .collect();

        Ok(Self { columns, rows })
    }

    /// Rows as `(line number, [requested fields])`. Rows that did not decode
    /// or are too short to hold every requested column yield `None`.
    pub(crate) fn records(&self) -> impl Iterator<Item = (usize, Option<Vec<&str>>)> + '_ {
        self.rows.iter().map(move |(line_no, fields)| {
            let picked = fields.as_ref().and_then(|fields| {
                self.columns
                    .iter()
                    .map(|&c| fields.get(c).map(String::as_str))
                    .collect::<Option<Vec<_>>>()
            });
            (*line_no, picked)
        })
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}

/// Parse an export timestamp and truncate it to the start of its minute.
pub(crate) fn parse_minute(value: &str) -> Option<NaiveDateTime> {
    let ts = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())?;
    ts.with_second(0)?.with_nanosecond(0)
}
