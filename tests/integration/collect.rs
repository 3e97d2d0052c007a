//! End-to-end collection tests.
//!
//! These tests run the standard pipeline against a scripted two-project
//! cluster and check what lands on disk.

use std::fs;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use diagdump::collect::standard_pipeline;
use diagdump::config::Config;
use diagdump::engine::{run_all, TerminalGate, WorkerPool};
use diagdump::runner::testing::FakeRunner;

use crate::fixtures::{cluster, scripted_runner};

fn dump(runner: FakeRunner, config: &Config) -> (TempDir, diagdump::engine::Summary) {
    let dir = TempDir::new().unwrap();
    let pipeline = standard_pipeline(config, cluster(Arc::new(runner)), dir.path()).unwrap();
    let summary = run_all(
        pipeline,
        &WorkerPool::new(config.workers).unwrap(),
        std::io::sink(),
    )
    .unwrap();
    (dir, summary)
}

/// Test: Full dump
/// Given a cluster with a monitoring pod in one project
/// When the standard pipeline runs
/// Then every collector writes its output and only missing previous logs
/// fail
#[test]
fn test_full_dump_writes_every_category() {
    let (dir, summary) = dump(scripted_runner(true), &Config::default());
    let base = dir.path();

    // definitions 2, logs 4, monitor 2, diagnostics 1, analysis 2
    assert_eq!(summary.total, 11, "{:?}", summary.failures);
    assert_eq!(summary.failed(), 2, "{:?}", summary.failures);
    assert!(summary
        .failures
        .iter()
        .all(|f| f.label.ends_with("(previous)")));

    assert!(base.join("projects/mbaas/definitions/definitions.json").exists());
    assert_eq!(
        fs::read_to_string(base.join("projects/core/logs/pods_web-1_app.logs")).unwrap(),
        "log line\n"
    );
    assert!(base
        .join("projects/core/logs/pods_nagios-1_nagios_previous.stderr")
        .exists());
    assert_eq!(
        fs::read_to_string(base.join("projects/core/monitor/nagios-1.dat")).unwrap(),
        "monitor data"
    );
    assert!(base.join("projects/core/monitor/nagios-1.tar").exists());
    assert!(base.join("diagnostics/adm-diagnostics.txt").exists());

    let report: Value = serde_json::from_slice(
        &fs::read(base.join("projects/core/analysis/analysis.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["checks"][0]["name"], "pods-running");
    assert_eq!(report["checks"][0]["passed"], false);
    assert_eq!(report["checks"][1]["passed"], true);
}

/// Test: No monitoring pod anywhere
/// Given a cluster without a pod matching the monitor pattern
/// When the standard pipeline runs
/// Then exactly one failing task reports the absence
#[test]
fn test_missing_monitor_reported_once() {
    let (_dir, summary) = dump(scripted_runner(false), &Config::default());

    let absent: Vec<_> = summary
        .failures
        .iter()
        .filter(|f| f.label == "monitor")
        .collect();
    assert_eq!(absent.len(), 1);
    assert!(absent[0].message.contains("no pod matching 'nagios'"));
    assert_eq!(summary.total, 8, "{:?}", summary.failures);
}

/// Test: Configuration reaches the commands
/// Given a narrower resource list and log limit
/// When the standard pipeline runs
/// Then the client is invoked with them
#[test]
fn test_config_flows_into_commands() {
    let runner = Arc::new(
        FakeRunner::new()
            .respond("get projects", r#"{"items":[{"metadata":{"name":"core"}}]}"#, "", 0)
            .respond("-n core get pods -o json", r#"{"items":[{"metadata":{"name":"web-1"}}]}"#, "", 0)
            .respond(
                "get pod web-1 -o json",
                r#"{"spec":{"containers":[{"name":"app"}]}}"#,
                "",
                0,
            )
            .respond("get services -o json", r#"{"items":[]}"#, "", 0),
    );
    let config = Config {
        workers: 2,
        resources: vec!["services".to_string()],
        max_log_lines: 10,
        analysis_gate: TerminalGate::Emitted,
        ..Config::default()
    };
    let dir = TempDir::new().unwrap();
    let pipeline = standard_pipeline(&config, cluster(runner.clone()), dir.path()).unwrap();
    run_all(pipeline, &WorkerPool::new(2).unwrap(), std::io::sink()).unwrap();

    let calls = runner.calls();
    assert!(calls.contains(&"oc -n core get services -o json".to_string()));
    assert!(calls.contains(&"oc -n core logs pods/web-1 -c app --tail=10".to_string()));
}
