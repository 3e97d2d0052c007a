//! Monitoring data from pods running the monitoring service.
//!
//! Not every project runs one, but across the whole cluster at least one is
//! expected; finding none is reported as a failure.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::collect::client::Cluster;
use crate::engine::{ProducerGroup, Task, TaskSender};
use crate::error::{Error, Result};
use crate::naming::OutputPath;
use crate::runner::run_to_files;

/// Status file read from inside a monitoring pod.
pub const STATUS_DATA_PATH: &str = "/var/log/nagios/status.dat";
/// Directory (and entry inside it) archived for historical data.
pub const HISTORY_DIR: &str = "/var/log/nagios";
pub const HISTORY_ENTRY: &str = "archives";

/// Finds resources of `kind` in `project` whose name matches a pattern.
pub type ResourceMatcher = Arc<dyn Fn(&str, &str, &Regex) -> Result<Vec<String>> + Send + Sync>;

pub fn resource_matcher<F>(f: F) -> ResourceMatcher
where
    F: Fn(&str, &str, &Regex) -> Result<Vec<String>> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct MonitorGroup {
    cluster: Cluster,
    matcher: ResourceMatcher,
    pattern: Regex,
    status_out: OutputPath,
    history_out: OutputPath,
}

impl MonitorGroup {
    pub fn new(cluster: Cluster, pattern: Regex, base: &Path) -> Self {
        let lookup = cluster.clone();
        let matcher = resource_matcher(move |project, kind, pattern| {
            lookup.names_matching(project, kind, pattern)
        });
        Self {
            cluster,
            matcher,
            pattern,
            status_out: OutputPath::new(base, "dat", "monitor"),
            history_out: OutputPath::new(base, "tar", "monitor"),
        }
    }

    /// Replace how matching pods are found.
    pub fn with_matcher(mut self, matcher: ResourceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Task running `command` in `pod`. Stdout lands in `<pod>.<ext>`,
    /// stderr in `<pod>_<part>.stderr` so the tasks of one pod never share a
    /// file.
    fn exec_task(
        &self,
        project: &str,
        pod: &str,
        part: &str,
        command: &[&str],
        out: &OutputPath,
    ) -> Task {
        let cmd = self
            .cluster
            .in_project(project)
            .args(["exec", pod, "--"])
            .args(command.iter().copied());
        let out_path = out.path_for(project, pod);
        let err_path = out
            .with_extension("stderr")
            .path_for(project, &format!("{}_{}", pod, part));
        let cluster = self.cluster.clone();
        Task::new(
            format!("monitor:{}/{} {}", project, pod, part),
            move || run_to_files(cluster.runner(), &cmd, &out_path, &err_path),
        )
    }

    fn absent(&self) -> Error {
        Error::NothingMatched(format!(
            "no pod matching '{}' was found in any project; for a more thorough analysis, \
             make sure the monitoring service is running in every project",
            self.pattern
        ))
    }
}

impl ProducerGroup for MonitorGroup {
    fn name(&self) -> &str {
        "monitor"
    }

    fn emit(&self, tasks: &TaskSender, projects: &[String]) {
        let mut found = false;
        for project in projects {
            let pods = match (self.matcher)(project, "pod", &self.pattern) {
                Ok(pods) => pods,
                Err(err) => {
                    tasks.send(Task::failing(format!("monitor:{}", project), err));
                    continue;
                }
            };
            for pod in pods {
                found = true;
                tasks.send(self.exec_task(
                    project,
                    &pod,
                    "status",
                    &["cat", STATUS_DATA_PATH],
                    &self.status_out,
                ));
                tasks.send(self.exec_task(
                    project,
                    &pod,
                    "history",
                    &["tar", "-c", "-C", HISTORY_DIR, HISTORY_ENTRY],
                    &self.history_out,
                ));
            }
        }

        if !found {
            tasks.send(Task::failing("monitor", self.absent()));
        }
    }
}
