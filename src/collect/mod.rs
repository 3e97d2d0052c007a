//! Producer groups that dump the state of a cluster.
//!
//! ```text
//! definitions ─┐
//! logs ────────┤
//! monitor ─────┼─► (barrier) ─► analysis
//! diagnostics ─┘
//! ```

pub mod analysis;
pub mod client;
pub mod definitions;
pub mod diagnostics;
pub mod logs;
pub mod monitor;

pub use analysis::{analyze, AnalysisGroup, Check, Report};
pub use client::{Cluster, LoggableResource};
pub use definitions::{DefinitionsGroup, DEFINITIONS_RESOURCE};
pub use diagnostics::DiagnosticsGroup;
pub use logs::{collect_loggable, LogsGroup};
pub use monitor::{resource_matcher, MonitorGroup, ResourceMatcher};

use std::path::Path;

use regex::Regex;

use crate::config::Config;
use crate::engine::Pipeline;
use crate::naming::OutputPath;
use crate::Result;

/// The full dump: every collector as a producer group, analysis last.
pub fn standard_pipeline(config: &Config, cluster: Cluster, base: &Path) -> Result<Pipeline> {
    let pattern = Regex::new(&config.monitor_pattern)?;
    let definitions = OutputPath::new(base, "json", "definitions");

    Ok(Pipeline::new(cluster.clone())
        .group(DefinitionsGroup::new(
            cluster.clone(),
            config.resources.clone(),
            definitions.clone(),
        ))
        .group(LogsGroup::new(
            cluster.clone(),
            config.log_resources.clone(),
            config.max_log_lines,
            OutputPath::new(base, "logs", "logs"),
        ))
        .group(MonitorGroup::new(cluster.clone(), pattern, base))
        .group(DiagnosticsGroup::new(cluster, base))
        .terminal(AnalysisGroup::new(
            definitions,
            OutputPath::new(base, "json", "analysis"),
        ))
        .gate(config.analysis_gate)
        .capacity(config.channel_capacity))
}
