//! Consumption of the results stream.

use std::io::Write;

use crossbeam_channel::Receiver;

use crate::engine::task::Outcome;
use crate::dlog_error;

/// Written for every task that succeeded.
pub const PROGRESS_OK: &str = ".";
/// Written for every task that failed, ahead of its log line.
pub const PROGRESS_FAILED: &str = "!\n";

/// One failed task as reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub label: String,
    pub message: String,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed()
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tasks run, {} succeeded, {} failed",
            self.total,
            self.succeeded(),
            self.failed()
        )
    }
}

/// Drains the results stream, printing progress and logging failures.
///
/// A failed task never stops the aggregator.
pub struct Aggregator<W: Write> {
    progress: W,
}

impl<W: Write> Aggregator<W> {
    pub fn new(progress: W) -> Self {
        Self { progress }
    }

    /// Consume `results` until it closes.
    pub fn consume(mut self, results: Receiver<Outcome>) -> Summary {
        let mut summary = Summary::default();
        for outcome in results.iter() {
            summary.total += 1;
            match outcome.error {
                None => self.mark(PROGRESS_OK),
                Some(err) => {
                    self.mark(PROGRESS_FAILED);
                    dlog_error!("Task '{}' failed: {}", outcome.label, err);
                    summary.failures.push(Failure {
                        label: outcome.label,
                        message: err.to_string(),
                    });
                }
            }
        }
        self.mark("\n");
        summary
    }

    fn mark(&mut self, marker: &str) {
        // Progress output is best effort.
        let _ = self.progress.write_all(marker.as_bytes());
        let _ = self.progress.flush();
    }
}
