use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::config::Config;
use crate::engine::ProjectSource;
use crate::runner::{CommandSpec, Runner};
use crate::{dlog_debug, Error, Result};

/// Something whose logs can be fetched: a resource, optionally narrowed to
/// one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggableResource {
    pub project: String,
    pub kind: String,
    pub name: String,
    pub container: Option<String>,
}

impl LoggableResource {
    /// `kind/name` as the client expects it.
    pub fn target(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Name used for output files.
    pub fn file_stem(&self) -> String {
        match &self.container {
            Some(container) => format!("{}_{}_{}", self.kind, self.name, container),
            None => format!("{}_{}", self.kind, self.name),
        }
    }
}

/// Builds and runs cluster client invocations.
#[derive(Clone)]
pub struct Cluster {
    binary: String,
    runner: Arc<dyn Runner>,
}

impl Cluster {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn Runner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn Runner>) -> Self {
        Self::new(config.client.trim(), runner)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    pub fn in_project(&self, project: &str) -> CommandSpec {
        self.command().args(["-n", project])
    }

    pub fn projects(&self) -> Result<Vec<String>> {
        let cmd = self.command().args(["get", "projects", "-o", "json"]);
        let names = item_names(&self.get_json(&cmd)?)?;
        dlog_debug!("Cluster::projects found {}", names.len());
        Ok(names)
    }

    pub fn resource_names(&self, project: &str, kind: &str) -> Result<Vec<String>> {
        let cmd = self.in_project(project).args(["get", kind, "-o", "json"]);
        item_names(&self.get_json(&cmd)?)
    }

    pub fn names_matching(&self, project: &str, kind: &str, pattern: &Regex) -> Result<Vec<String>> {
        Ok(self
            .resource_names(project, kind)?
            .into_iter()
            .filter(|name| pattern.is_match(name))
            .collect())
    }

    pub fn containers(&self, project: &str, pod: &str) -> Result<Vec<String>> {
        let cmd = self.in_project(project).args(["get", "pod", pod, "-o", "json"]);
        container_names(&self.get_json(&cmd)?)
    }

    /// Expand one resource into the things that have logs: one per
    /// container for pods, the resource itself otherwise.
    pub fn loggable_resources(&self, project: &str, kind: &str, name: &str) -> Result<Vec<LoggableResource>> {
        let resource = |container: Option<String>| LoggableResource {
            project: project.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            container,
        };
        if !matches!(kind, "pod" | "pods" | "po") {
            return Ok(vec![resource(None)]);
        }
        Ok(self
            .containers(project, name)?
            .into_iter()
            .map(|c| resource(Some(c)))
            .collect())
    }

    fn get_json(&self, cmd: &CommandSpec) -> Result<Value> {
        let output = self.runner.run(cmd)?.check(cmd)?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl ProjectSource for Cluster {
    fn projects(&self) -> Result<Vec<String>> {
        Cluster::projects(self)
    }
}

/// `.items[*].metadata.name` of a list document.
fn item_names(list: &Value) -> Result<Vec<String>> {
    let items = list
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::UnexpectedOutput("expected a list with `items`".to_string()))?;
    Ok(items
        .iter()
        .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
        .map(String::from)
        .collect())
}

/// `.spec.containers[*].name` of a pod document.
fn container_names(pod: &Value) -> Result<Vec<String>> {
    let containers = pod
        .pointer("/spec/containers")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::UnexpectedOutput("pod has no `spec.containers`".to_string()))?;
    Ok(containers
        .iter()
        .filter_map(|c| c.get("name").and_then(Value::as_str))
        .map(String::from)
        .collect())
}
