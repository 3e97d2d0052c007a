use std::path::Path;

use crate::collect::client::Cluster;
use crate::engine::{ProducerGroup, Task, TaskSender};
use crate::naming::OutputPath;
use crate::runner::run_to_files;

/// Runs the client's built-in cluster diagnostics once.
pub struct DiagnosticsGroup {
    cluster: Cluster,
    out: OutputPath,
}

impl DiagnosticsGroup {
    pub fn new(cluster: Cluster, base: &Path) -> Self {
        Self {
            cluster,
            out: OutputPath::new(base, "txt", "diagnostics"),
        }
    }
}

impl ProducerGroup for DiagnosticsGroup {
    fn name(&self) -> &str {
        "diagnostics"
    }

    fn emit(&self, tasks: &TaskSender, _projects: &[String]) {
        let cmd = self.cluster.command().args(["adm", "diagnostics"]);
        let out = self.out.cluster_path("adm-diagnostics");
        let err_out = self.out.with_extension("stderr").cluster_path("adm-diagnostics");
        let cluster = self.cluster.clone();
        tasks.send(Task::new("diagnostics", move || {
            run_to_files(cluster.runner(), &cmd, &out, &err_out)
        }));
    }
}
