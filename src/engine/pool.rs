//! Worker pool for task execution.
//!
//! The `WorkerPool` runs a fixed number of worker threads against the task
//! stream. Each worker pulls a task, runs it, and pushes its outcome into
//! the results stream. A supervisor thread closes the results stream once
//! every worker has exited.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::engine::task::{Outcome, Task};
use crate::error::{Error, Result};
use crate::{dlog_debug, dlog_error, dlog_warn};

/// Fixed-size set of interchangeable workers.
///
/// # Example
///
/// ```ignore
/// use diagdump::engine::{Task, WorkerPool};
///
/// let (tx, rx) = crossbeam_channel::unbounded();
/// tx.send(Task::new("hello", || Ok(()))).unwrap();
/// drop(tx);
///
/// let pool = WorkerPool::new(4)?;
/// let results = pool.start(rx)?;
/// assert_eq!(results.iter().count(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// Number of worker threads.
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with `workers` threads.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Validation(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        Ok(Self { workers })
    }

    /// Get the number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start the workers against `tasks`.
    ///
    /// Returns the results stream. It yields one [`Outcome`] per task and
    /// closes after `tasks` is closed and drained and every worker has
    /// exited.
    pub fn start(&self, tasks: Receiver<Task>) -> Result<Receiver<Outcome>> {
        let (results_tx, results_rx) = crossbeam_channel::bounded(0);

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let tasks = tasks.clone();
            let results = results_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || work(id, tasks, results))?;
            handles.push(handle);
        }
        dlog_debug!("Started {} workers", self.workers);

        thread::Builder::new()
            .name("pool-supervisor".to_string())
            .spawn(move || supervise(handles, results_tx))?;

        Ok(results_rx)
    }
}

fn work(id: usize, tasks: Receiver<Task>, results: Sender<Outcome>) -> usize {
    let mut ran = 0;
    for task in tasks.iter() {
        dlog_debug!("worker-{} running '{}'", id, task.label());
        let outcome = task.run();
        ran += 1;
        if results.send(outcome).is_err() {
            dlog_warn!("worker-{}: results stream closed, stopping", id);
            break;
        }
    }
    dlog_debug!("worker-{} exiting after {} tasks", id, ran);
    ran
}

/// Wait for every worker, then close the results stream by dropping the
/// last sender.
fn supervise(handles: Vec<JoinHandle<usize>>, results: Sender<Outcome>) {
    let mut total = 0;
    for handle in handles {
        match handle.join() {
            Ok(ran) => total += ran,
            Err(_) => dlog_error!("A worker thread panicked"),
        }
    }
    dlog_debug!("All workers exited, {} tasks run", total);
    drop(results);
}
