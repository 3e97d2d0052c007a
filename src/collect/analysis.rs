//! Post-collection analysis of dumped definitions.
//!
//! Runs as the terminal group: each task reads the definitions file an
//! earlier task wrote for its project and records a set of checks.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::collect::definitions::DEFINITIONS_RESOURCE;
use crate::engine::{ProducerGroup, Task, TaskSender};
use crate::naming::{write_file, OutputPath};
use crate::{dlog_debug, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub details: Vec<String>,
}

impl Check {
    fn new(name: &str, details: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: details.is_empty(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub project: String,
    pub checks: Vec<Check>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Run every check over a project's definitions list.
pub fn analyze(project: &str, definitions: &Value) -> Report {
    let items: &[Value] = definitions
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Report {
        project: project.to_string(),
        checks: vec![
            Check::new("pods-running", unhealthy_pods(items)),
            Check::new("deployments-ready", unready_deployments(items)),
            Check::new("warning-events", warning_events(items)),
        ],
    }
}

fn of_kind<'a>(items: &'a [Value], kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    items
        .iter()
        .filter(move |item| item.get("kind").and_then(Value::as_str) == Some(kind))
}

fn str_at<'a>(item: &'a Value, pointer: &str) -> &'a str {
    item.pointer(pointer).and_then(Value::as_str).unwrap_or("?")
}

fn unhealthy_pods(items: &[Value]) -> Vec<String> {
    of_kind(items, "Pod")
        .filter_map(|pod| {
            let phase = str_at(pod, "/status/phase");
            match phase {
                "Running" | "Succeeded" => None,
                _ => Some(format!(
                    "pod {} is in phase {}",
                    str_at(pod, "/metadata/name"),
                    phase
                )),
            }
        })
        .collect()
}

fn unready_deployments(items: &[Value]) -> Vec<String> {
    of_kind(items, "DeploymentConfig")
        .filter_map(|dc| {
            let desired = dc.pointer("/spec/replicas").and_then(Value::as_u64).unwrap_or(0);
            let ready = dc
                .pointer("/status/readyReplicas")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            (ready < desired).then(|| {
                format!(
                    "deploymentconfig {} has {}/{} ready replicas",
                    str_at(dc, "/metadata/name"),
                    ready,
                    desired
                )
            })
        })
        .collect()
}

fn warning_events(items: &[Value]) -> Vec<String> {
    of_kind(items, "Event")
        .filter(|event| event.get("type").and_then(Value::as_str) == Some("Warning"))
        .map(|event| {
            format!(
                "{}/{}: {}: {}",
                str_at(event, "/involvedObject/kind"),
                str_at(event, "/involvedObject/name"),
                str_at(event, "/reason"),
                str_at(event, "/message")
            )
        })
        .collect()
}

fn analyze_file(project: &str, definitions: PathBuf, out: PathBuf) -> Result<()> {
    let raw = fs::read(&definitions)?;
    let report = analyze(project, &serde_json::from_slice(&raw)?);
    dlog_debug!(
        "Analysis of {}: {}",
        project,
        if report.passed() { "all checks passed" } else { "issues found" }
    );
    write_file(&out, &serde_json::to_vec_pretty(&report)?)
}

/// One analysis task per project, reading the definitions group's output.
pub struct AnalysisGroup {
    definitions: OutputPath,
    out: OutputPath,
}

impl AnalysisGroup {
    pub fn new(definitions: OutputPath, out: OutputPath) -> Self {
        Self { definitions, out }
    }
}

impl ProducerGroup for AnalysisGroup {
    fn name(&self) -> &str {
        "analysis"
    }

    fn emit(&self, tasks: &TaskSender, projects: &[String]) {
        for project in projects {
            let input = self.definitions.path_for(project, DEFINITIONS_RESOURCE);
            let output = self.out.path_for(project, "analysis");
            let project = project.clone();
            tasks.send(Task::new(format!("analysis:{}", project), move || {
                analyze_file(&project, input, output)
            }));
        }
    }
}
