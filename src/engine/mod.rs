//! Concurrent task engine.
//!
//! Three stages connected by channels:
//!
//! ```text
//! Pipeline (producer groups ─► barrier ─► terminal group)
//!     │ task stream
//!     ▼
//! WorkerPool (N threads)
//!     │ results stream
//!     ▼
//! Aggregator (progress + failure log)
//! ```
//!
//! Closing the task stream is the only signal that stops the workers, and
//! closing the results stream is the only signal that stops the aggregator.

pub mod aggregate;
pub mod pipeline;
pub mod pool;
pub mod stream;
pub mod task;

pub use aggregate::{Aggregator, Failure, Summary};
pub use pipeline::{group_fn, FnGroup, Pipeline, ProducerGroup, ProjectSource, TerminalGate};
pub use pool::WorkerPool;
pub use stream::{task_stream, TaskSender};
pub use task::{Outcome, Task};

use std::io::Write;

use crate::error::Result;
use crate::{dlog, dlog_error};

/// Generate, execute and aggregate every task of one run.
///
/// Task failures are reported in the returned [`Summary`], never as an
/// `Err`; only failing to start the engine's threads is an error.
pub fn run_all<W: Write>(pipeline: Pipeline, pool: &WorkerPool, progress: W) -> Result<Summary> {
    let (tasks, generator) = pipeline.start()?;
    let results = pool.start(tasks)?;
    let summary = Aggregator::new(progress).consume(results);

    if generator.join().is_err() {
        dlog_error!("Task generator panicked");
    }
    dlog!("{}", summary);
    Ok(summary)
}
