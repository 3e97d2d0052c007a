use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use diagdump::collect::{standard_pipeline, Cluster};
use diagdump::config::Config;
use diagdump::engine::{run_all, TerminalGate, WorkerPool};
use diagdump::runner::ProcessRunner;
use diagdump::{dlog, dlog_debug, Error, Result};

/// Diagdump - collect a diagnostic dump of a cluster in parallel
#[derive(Parser, Debug)]
#[command(name = "diagdump")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    DIAGDUMP_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Number of tasks run concurrently
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Directory that receives one timestamped subdirectory per run
    #[arg(short = 'o', long)]
    pub output_dir: Option<String>,

    /// Cluster client binary
    #[arg(long)]
    pub client: Option<String>,

    /// Maximum number of log lines fetched per container
    #[arg(long)]
    pub max_log_lines: Option<u32>,

    /// Per-command timeout in seconds (0 disables)
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// When the analysis step may start
    #[arg(long, value_enum)]
    pub gate: Option<TerminalGate>,

    /// Config file (defaults to ~/.diagdump/diagdump.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Collect a dump (default)
    Run,

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Load the configured file and apply command-line overrides.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(client) = &self.client {
            config.client = client.clone();
        }
        if let Some(lines) = self.max_log_lines {
            config.max_log_lines = lines;
        }
        if let Some(secs) = self.timeout_secs {
            config.command_timeout_secs = secs;
        }
        if let Some(gate) = self.gate {
            config.analysis_gate = gate;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Run => run_dump(&config, cli.debug),
    }
}

/// Timestamped directory for one run under `base`.
fn run_dir(base: &Path) -> PathBuf {
    base.join(chrono::Local::now().format("%Y-%m-%dT%H-%M-%S").to_string())
}

fn run_dump(config: &Config, debug: bool) -> Result<()> {
    let dir = run_dir(&config.output_path());
    fs::create_dir_all(&dir)?;
    diagdump::log::init(debug, Some(dir.join("diagdump.log")));
    dlog!("Writing dump to {}", dir.display());

    let runner = ProcessRunner::new(config.command_timeout())?;
    let cluster = Cluster::from_config(config, Arc::new(runner));
    if !cluster.is_available() {
        return Err(Error::ClientNotFound(cluster.binary().to_string()));
    }
    dlog_debug!(
        "Using client {} with {} workers, gate {:?}",
        cluster.binary(),
        config.workers,
        config.analysis_gate
    );

    let pipeline = standard_pipeline(config, cluster, &dir)?;
    let pool = WorkerPool::new(config.workers)?;
    let summary = run_all(pipeline, &pool, io::stderr())?;

    println!("Dump written to {}", dir.display());
    println!("{}", summary);
    for failure in &summary.failures {
        println!("  {}: {}", failure.label, failure.message);
    }
    Ok(())
}
