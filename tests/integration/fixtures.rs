//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Fixed project sources
//! - Producer groups that emit a known number of tasks
//! - An event journal shared between tasks
//! - A scripted cluster with two projects

use std::sync::{Arc, Mutex};
use std::time::Duration;

use diagdump::collect::Cluster;
use diagdump::engine::{group_fn, ProducerGroup, Task, TaskSender};
use diagdump::runner::testing::FakeRunner;
use diagdump::Result;

/// A project source that always returns `names`.
pub fn projects(names: &[&str]) -> impl Fn() -> Result<Vec<String>> + Send + 'static {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    move || Ok(names.clone())
}

/// Ordered record of what tasks did, shared across worker threads.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn first(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }

    /// Index of the last entry starting with `prefix`.
    pub fn last(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().rposition(|e| e.starts_with(prefix))
    }
}

/// A group emitting `per_project` successful tasks for each project,
/// labelled `<name>:<project>:<i>`.
pub fn counting_group(name: &'static str, per_project: usize) -> impl ProducerGroup {
    group_fn(name, move |tasks: &TaskSender, projects: &[String]| {
        for project in projects {
            for i in 0..per_project {
                tasks.send(Task::new(format!("{}:{}:{}", name, project, i), || Ok(())));
            }
        }
    })
}

/// Like [`counting_group`], but each task sleeps for `work` and records
/// `start <label>` / `end <label>` in `journal`.
pub fn journaled_group(
    name: &'static str,
    per_project: usize,
    work: Duration,
    journal: Journal,
) -> impl ProducerGroup {
    group_fn(name, move |tasks: &TaskSender, projects: &[String]| {
        for project in projects {
            for i in 0..per_project {
                let label = format!("{}:{}:{}", name, project, i);
                let journal = journal.clone();
                let task_label = label.clone();
                tasks.send(Task::new(label, move || {
                    journal.record(format!("start {}", task_label));
                    std::thread::sleep(work);
                    journal.record(format!("end {}", task_label));
                    Ok(())
                }));
            }
        }
    })
}

pub const PROJECTS_JSON: &str =
    r#"{"kind":"List","items":[{"metadata":{"name":"core"}},{"metadata":{"name":"mbaas"}}]}"#;

pub const DEFINITIONS_JSON: &str = r#"{"kind":"List","items":[
    {"kind":"Pod","metadata":{"name":"web-1"},"status":{"phase":"Running"}},
    {"kind":"Pod","metadata":{"name":"nagios-1"},"status":{"phase":"CrashLoopBackOff"}},
    {"kind":"DeploymentConfig","metadata":{"name":"web"},
     "spec":{"replicas":2},"status":{"readyReplicas":2}}
]}"#;

/// A runner scripted for a two-project cluster (`core`, `mbaas`) where only
/// `core` runs a monitoring pod, and `mbaas` has no pods at all.
pub fn scripted_runner(with_monitor: bool) -> FakeRunner {
    let core_pods = if with_monitor {
        r#"{"items":[{"metadata":{"name":"web-1"}},{"metadata":{"name":"nagios-1"}}]}"#
    } else {
        r#"{"items":[{"metadata":{"name":"web-1"}}]}"#
    };
    FakeRunner::new()
        .respond("get projects", PROJECTS_JSON, "", 0)
        .respond("get deploymentconfigs,pods", DEFINITIONS_JSON, "", 0)
        .respond("-n core get pods -o json", core_pods, "", 0)
        .respond("-n core get pod -o json", core_pods, "", 0)
        .respond("-n mbaas get pods -o json", r#"{"items":[]}"#, "", 0)
        .respond("-n mbaas get pod -o json", r#"{"items":[]}"#, "", 0)
        .respond(
            "get pod web-1 -o json",
            r#"{"spec":{"containers":[{"name":"app"}]}}"#,
            "",
            0,
        )
        .respond(
            "get pod nagios-1 -o json",
            r#"{"spec":{"containers":[{"name":"nagios"}]}}"#,
            "",
            0,
        )
        .respond("--previous", "", "previous terminated container not found", 1)
        .respond(" logs ", "log line\n", "", 0)
        .respond(" exec ", "monitor data", "", 0)
        .respond("adm diagnostics", "[Note] Summary: 0 errors", "", 0)
}

pub fn cluster(runner: Arc<FakeRunner>) -> Cluster {
    Cluster::new("oc", runner)
}
