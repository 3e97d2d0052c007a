//! The task stream shared by every producer group.

use crossbeam_channel::{Receiver, Sender};

use crate::engine::task::Task;
use crate::dlog_warn;

/// Create a task stream.
///
/// A capacity of zero gives a rendezvous channel: a producer blocks until a
/// worker takes the task.
pub fn task_stream(capacity: usize) -> (TaskSender, Receiver<Task>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (TaskSender::new(tx), rx)
}

/// Write-only handle producers push tasks through.
///
/// The stream closes once every `TaskSender` clone has been dropped.
#[derive(Clone)]
pub struct TaskSender {
    tx: Sender<Task>,
    /// Attached to every task sent through this handle, when set.
    completion: Option<Sender<()>>,
}

impl TaskSender {
    pub(crate) fn new(tx: Sender<Task>) -> Self {
        Self {
            tx,
            completion: None,
        }
    }

    /// A handle whose tasks hold `completion` until they have run.
    pub(crate) fn tracking(&self, completion: Sender<()>) -> Self {
        Self {
            tx: self.tx.clone(),
            completion: Some(completion),
        }
    }

    /// Push a task, blocking until there is room.
    ///
    /// Returns false if nothing is left to receive it, in which case the task
    /// is dropped unrun.
    pub fn send(&self, task: Task) -> bool {
        let task = match &self.completion {
            Some(completion) => task.with_completion(completion.clone()),
            None => task,
        };
        match self.tx.send(task) {
            Ok(()) => true,
            Err(err) => {
                dlog_warn!("Task stream closed, dropping task '{}'", err.0.label());
                false
            }
        }
    }
}
