//! Sliding window of per-minute buckets.
//!
//! The window is a fixed-capacity FIFO: appending past capacity drops the
//! oldest minutes. Every retained bucket weighs the same when a baseline is
//! computed over it.

mod bucket;

pub use self::bucket::{AuthCode, Bucket, Status};

use std::collections::VecDeque;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window size must be a positive number of minutes, got {0}")]
    InvalidSize(usize),
}

/// Live monitoring state: the most recent `window_size` minutes.
#[derive(Debug, Clone)]
pub struct WindowState {
    window_size: usize,
    buckets: VecDeque<Bucket>,
}

impl WindowState {
    pub fn new(window_size: usize) -> Result<Self, WindowError> {
        if window_size == 0 {
            return Err(WindowError::InvalidSize(window_size));
        }
        Ok(Self {
            window_size,
            buckets: VecDeque::with_capacity(window_size),
        })
    }

    /// Append a minute and evict from the front until the bound holds.
    ///
    /// Buckets are kept in arrival order; the caller feeds them
    /// chronologically.
    pub fn add_bucket(&mut self, bucket: Bucket) {
        self.buckets.push_back(bucket);
        while self.buckets.len() > self.window_size {
            self.buckets.pop_front();
        }
    }

    pub fn latest_bucket(&self) -> Option<&Bucket> {
        self.buckets.back()
    }

    /// Count of `status` for every minute in the window, oldest first.
    pub fn status_series(&self, status: &Status) -> Vec<u64> {
        self.buckets.iter().map(|b| b.status_count(status)).collect()
    }

    /// Count of `code` for every minute in the window, oldest first.
    pub fn auth_code_series(&self, code: AuthCode) -> Vec<u64> {
        self.buckets.iter().map(|b| b.auth_code_count(code)).collect()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }
}
