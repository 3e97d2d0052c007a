//! Task data model for the dump engine.
//!
//! A task is a labelled, opaque unit of work that runs once and reports
//! success or failure. Tasks that represent a failure known up front
//! (nothing to enumerate, nothing matched) are built with
//! [`Task::failing`] and travel through the same stream and workers as real
//! work.

use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::Sender;

use crate::error::{Error, Result};

type TaskBody = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// A single unit of work.
///
/// Running a task consumes it, so a task can never execute twice.
pub struct Task {
    label: String,
    body: TaskBody,
    /// Dropped once the body has run; see [`crate::engine::TerminalGate`].
    completion: Option<Sender<()>>,
}

impl Task {
    /// Create a task from a closure.
    pub fn new<F>(label: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            body: Box::new(body),
            completion: None,
        }
    }

    /// Create a task that does no work and fails with `err`.
    pub fn failing(label: impl Into<String>, err: Error) -> Self {
        Self::new(label, move || Err(err))
    }

    /// Human-readable label, carried into the task's [`Outcome`].
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn with_completion(mut self, completion: Sender<()>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Run the task to completion.
    ///
    /// A panic in the body is caught and reported as
    /// [`Error::TaskPanicked`] so the calling worker keeps going.
    pub fn run(self) -> Outcome {
        let Task {
            label,
            body,
            completion,
        } = self;

        let error = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(_) => Some(Error::TaskPanicked(label.clone())),
        };
        drop(completion);

        Outcome { label, error }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish()
    }
}

/// Result of running exactly one task.
#[derive(Debug)]
pub struct Outcome {
    /// Label of the task that produced this outcome.
    pub label: String,
    /// The error the task failed with, if any.
    pub error: Option<Error>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
