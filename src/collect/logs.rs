use crate::collect::client::{Cluster, LoggableResource};
use crate::engine::{ProducerGroup, Task, TaskSender};
use crate::error::{Error, ErrorList};
use crate::naming::OutputPath;
use crate::runner::run_to_files;
use crate::dlog_debug;

/// Fetches current and previous logs of every loggable resource.
pub struct LogsGroup {
    cluster: Cluster,
    kinds: Vec<String>,
    max_lines: u32,
    out: OutputPath,
}

impl LogsGroup {
    pub fn new(cluster: Cluster, kinds: Vec<String>, max_lines: u32, out: OutputPath) -> Self {
        Self {
            cluster,
            kinds,
            max_lines,
            out,
        }
    }

    fn task(&self, resource: &LoggableResource, previous: bool) -> Task {
        let mut cmd = self
            .cluster
            .in_project(&resource.project)
            .args(["logs".to_string(), resource.target()]);
        if let Some(container) = &resource.container {
            cmd = cmd.args(["-c", container.as_str()]);
        }
        cmd = cmd.arg(format!("--tail={}", self.max_lines));

        let mut stem = resource.file_stem();
        let mut label = format!("logs:{}/{}", resource.project, resource.target());
        if let Some(container) = &resource.container {
            label.push_str(&format!(" -c {}", container));
        }
        if previous {
            cmd = cmd.arg("--previous");
            stem.push_str("_previous");
            label.push_str(" (previous)");
        }

        let out = self.out.path_for(&resource.project, &stem);
        let err_out = self.out.with_extension("stderr").path_for(&resource.project, &stem);
        let cluster = self.cluster.clone();
        Task::new(label, move || run_to_files(cluster.runner(), &cmd, &out, &err_out))
    }
}

impl ProducerGroup for LogsGroup {
    fn name(&self) -> &str {
        "logs"
    }

    fn emit(&self, tasks: &TaskSender, projects: &[String]) {
        let (resources, errors) = collect_loggable(&self.cluster, projects, &self.kinds);
        dlog_debug!(
            "LogsGroup: {} loggable resources, {} enumeration errors",
            resources.len(),
            errors.len()
        );
        if !errors.is_empty() {
            tasks.send(Task::failing("logs:enumerate", Error::Multiple(errors)));
        }
        for resource in &resources {
            tasks.send(self.task(resource, false));
            tasks.send(self.task(resource, true));
        }
    }
}

/// Enumerate loggable resources across `projects`, continuing past errors.
///
/// Whatever could be enumerated is returned alongside every error hit on
/// the way.
pub fn collect_loggable(
    cluster: &Cluster,
    projects: &[String],
    kinds: &[String],
) -> (Vec<LoggableResource>, ErrorList) {
    let mut resources = Vec::new();
    let mut errors = ErrorList::new();
    for project in projects {
        for kind in kinds {
            let names = match cluster.resource_names(project, kind) {
                Ok(names) => names,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            for name in names {
                match cluster.loggable_resources(project, kind, &name) {
                    Ok(found) => resources.extend(found),
                    Err(err) => errors.push(err),
                }
            }
        }
    }
    (resources, errors)
}
