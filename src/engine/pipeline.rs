//! Task generation.
//!
//! A [`Pipeline`] resolves the project set once, runs every producer group
//! concurrently against it, waits for all of them to finish emitting, and
//! only then lets the terminal group emit. Dropping the last sender closes
//! the stream, which is how workers learn there is nothing left.

use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::engine::stream::{task_stream, TaskSender};
use crate::engine::task::Task;
use crate::error::{Error, Result};
use crate::{dlog, dlog_debug, dlog_warn};

/// Supplies the projects (namespaces) most producer groups iterate over.
pub trait ProjectSource: Send {
    fn projects(&self) -> Result<Vec<String>>;
}

impl<F> ProjectSource for F
where
    F: Fn() -> Result<Vec<String>> + Send,
{
    fn projects(&self) -> Result<Vec<String>> {
        self()
    }
}

/// An independent generator of tasks.
///
/// `emit` must not fail: problems are pushed into the stream as failing
/// tasks instead.
pub trait ProducerGroup: Send {
    fn name(&self) -> &str;

    fn emit(&self, tasks: &TaskSender, projects: &[String]);
}

/// A producer group backed by a closure.
pub struct FnGroup<F> {
    name: String,
    emit: F,
}

/// Build a [`ProducerGroup`] from a name and a closure.
pub fn group_fn<F>(name: impl Into<String>, emit: F) -> FnGroup<F>
where
    F: Fn(&TaskSender, &[String]) + Send,
{
    FnGroup {
        name: name.into(),
        emit,
    }
}

impl<F> ProducerGroup for FnGroup<F>
where
    F: Fn(&TaskSender, &[String]) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, tasks: &TaskSender, projects: &[String]) {
        (self.emit)(tasks, projects)
    }
}

/// When the terminal group is allowed to emit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TerminalGate {
    /// Once every other group has finished emitting.
    Emitted,
    /// Once every other group has finished emitting and every task they
    /// emitted has finished running.
    #[default]
    Executed,
}

/// Builder and driver for one run's task stream.
pub struct Pipeline {
    source: Box<dyn ProjectSource>,
    groups: Vec<Box<dyn ProducerGroup>>,
    terminal: Option<Box<dyn ProducerGroup>>,
    gate: TerminalGate,
    capacity: usize,
}

impl Pipeline {
    pub fn new(source: impl ProjectSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            groups: Vec::new(),
            terminal: None,
            gate: TerminalGate::default(),
            capacity: 0,
        }
    }

    /// Add a group that runs concurrently with the others.
    pub fn group(mut self, group: impl ProducerGroup + 'static) -> Self {
        self.groups.push(Box::new(group));
        self
    }

    /// Set the group that emits only after all other groups are done.
    pub fn terminal(mut self, group: impl ProducerGroup + 'static) -> Self {
        self.terminal = Some(Box::new(group));
        self
    }

    pub fn gate(mut self, gate: TerminalGate) -> Self {
        self.gate = gate;
        self
    }

    /// Task stream capacity; zero is a rendezvous handoff.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Generate on a background thread and return the receiving end of the
    /// stream with the generator's handle.
    pub fn start(self) -> Result<(Receiver<Task>, JoinHandle<()>)> {
        let (tx, rx) = task_stream(self.capacity);
        let handle = thread::Builder::new()
            .name("task-generator".to_string())
            .spawn(move || self.generate(tx))?;
        Ok((rx, handle))
    }

    /// Generate every task into `tasks`, then close the stream by dropping it.
    pub fn generate(self, tasks: TaskSender) {
        let Pipeline {
            source,
            groups,
            terminal,
            gate,
            ..
        } = self;

        let projects = match source.projects() {
            Ok(projects) => projects,
            Err(err) => {
                dlog_debug!("Could not list projects: {}", err);
                tasks.send(Task::failing("projects", err));
                return;
            }
        };
        if projects.is_empty() {
            tasks.send(Task::failing("projects", Error::NoProjects));
            return;
        }
        dlog!(
            "Generating tasks for {} projects across {} groups",
            projects.len(),
            groups.len()
        );

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let group_sender = match gate {
            TerminalGate::Executed => tasks.tracking(done_tx),
            TerminalGate::Emitted => {
                drop(done_tx);
                tasks.clone()
            }
        };

        run_groups(groups, &group_sender, &tasks, &projects);
        drop(group_sender);
        dlog_debug!("All producer groups finished emitting");

        if gate == TerminalGate::Executed {
            // Disconnects once the last tracked task has run.
            let _ = done_rx.recv();
            dlog_debug!("All non-terminal tasks finished running");
        }

        if let Some(terminal) = terminal {
            dlog_debug!("Releasing terminal group '{}'", terminal.name());
            terminal.emit(&tasks, &projects);
        }
    }
}

/// Run every group on its own scoped thread and join them all.
fn run_groups(
    groups: Vec<Box<dyn ProducerGroup>>,
    group_sender: &TaskSender,
    tasks: &TaskSender,
    projects: &[String],
) {
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let name = group.name().to_string();
            let sender = group_sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("producer-{}", name))
                .spawn_scoped(s, move || {
                    group.emit(&sender, projects);
                    dlog_debug!("Producer group '{}' done", group.name());
                });
            match spawned {
                Ok(handle) => handles.push((name, handle)),
                Err(err) => {
                    dlog_warn!("Could not start producer group '{}': {}", name, err);
                    tasks.send(Task::failing(format!("group:{}", name), err.into()));
                }
            }
        }

        for (name, handle) in handles {
            if handle.join().is_err() {
                tasks.send(Task::failing(
                    format!("group:{}", name),
                    Error::ProducerPanicked(name),
                ));
            }
        }
    });
}
