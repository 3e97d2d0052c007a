use crate::collect::client::Cluster;
use crate::engine::{ProducerGroup, Task, TaskSender};
use crate::naming::OutputPath;
use crate::runner::run_to_files;

/// File stem of each project's definitions dump.
pub const DEFINITIONS_RESOURCE: &str = "definitions";

/// Dumps the definitions of the configured resource kinds, one task per
/// project.
pub struct DefinitionsGroup {
    cluster: Cluster,
    kinds: Vec<String>,
    out: OutputPath,
}

impl DefinitionsGroup {
    pub fn new(cluster: Cluster, kinds: Vec<String>, out: OutputPath) -> Self {
        Self { cluster, kinds, out }
    }

    fn task(&self, project: &str) -> Task {
        let cmd = self
            .cluster
            .in_project(project)
            .args(["get", self.kinds.join(",").as_str(), "-o", "json"]);
        let out = self.out.path_for(project, DEFINITIONS_RESOURCE);
        let err_out = self
            .out
            .with_extension("stderr")
            .path_for(project, DEFINITIONS_RESOURCE);
        let cluster = self.cluster.clone();

        Task::new(format!("definitions:{}", project), move || {
            run_to_files(cluster.runner(), &cmd, &out, &err_out)
        })
    }
}

impl ProducerGroup for DefinitionsGroup {
    fn name(&self) -> &str {
        "definitions"
    }

    fn emit(&self, tasks: &TaskSender, projects: &[String]) {
        for project in projects {
            tasks.send(self.task(project));
        }
    }
}
