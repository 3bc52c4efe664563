//! Monitoring cycle driver.
//!
//! Owns the window and processes one minute at a time: update the window,
//! publish a snapshot, evaluate the rules, and hand any signals to the
//! alert sink. Pacing between minutes is raced against a shutdown future, so
//! a stop request lands between cycles and never mid-cycle.

use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::{debug, error, info};

use crate::alert::AlertSink;
use crate::detect::{detect_status_anomalies, AnomalySignal, RuleConfig};
use crate::snapshot::SnapshotPublisher;
use crate::window::{Bucket, WindowState};

/// Totals for a finished (or interrupted) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub minutes: usize,
    pub signals: usize,
    pub interrupted: bool,
}

pub struct Monitor {
    state: WindowState,
    rules: RuleConfig,
    publishers: Vec<Box<dyn SnapshotPublisher>>,
    sink: Box<dyn AlertSink>,
}

impl Monitor {
    pub fn new(state: WindowState, rules: RuleConfig, sink: Box<dyn AlertSink>) -> Self {
        Self {
            state,
            rules,
            publishers: Vec::new(),
            sink,
        }
    }

    /// Add a snapshot publisher, invoked after every window update.
    pub fn with_publisher(mut self, publisher: Box<dyn SnapshotPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Run one monitoring cycle for `bucket` and return the signals it raised.
    ///
    /// Publisher and sink failures are logged and do not abort the cycle.
    pub async fn process_bucket(&mut self, bucket: Bucket) -> Vec<AnomalySignal> {
        info!(minute = %bucket.timestamp(), "processing minute");
        self.state.add_bucket(bucket);

        let Some(latest) = self.state.latest_bucket() else {
            return Vec::new();
        };

        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(&self.state).await {
                error!(error = %e, "failed to publish snapshot");
            }
        }

        let signals = detect_status_anomalies(&self.state, latest, &self.rules);
        if signals.is_empty() {
            debug!("no anomalies detected");
            return signals;
        }

        info!(count = signals.len(), "anomaly signals detected");
        if let Err(e) = self.sink.dispatch(&signals).await {
            error!(error = %e, "failed to dispatch alerts");
        }
        signals
    }

    /// Drive cycles from `buckets` until it ends or `shutdown` resolves.
    ///
    /// `tick` is the pause after each cycle; zero disables pacing.
    pub async fn run<S, F>(&mut self, buckets: S, tick: Duration, shutdown: F) -> RunSummary
    where
        S: Stream<Item = Bucket>,
        F: Future<Output = ()>,
    {
        tokio::pin!(buckets);
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        loop {
            let next = tokio::select! {
                biased;

                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                next = buckets.next() => next,
            };

            let Some(bucket) = next else {
                break;
            };

            let signals = self.process_bucket(bucket).await;
            summary.minutes += 1;
            summary.signals += signals.len();

            if tick.is_zero() {
                continue;
            }
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                _ = tokio::time::sleep(tick) => {}
            }
        }

        if summary.interrupted {
            info!(minutes = summary.minutes, "shutdown requested, monitor stopped");
        } else {
            info!(minutes = summary.minutes, signals = summary.signals, "input exhausted");
        }
        summary
    }
}
