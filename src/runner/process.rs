use std::process::Stdio;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::time::timeout;

use crate::runner::{CommandOutput, CommandSpec, Runner};
use crate::{dlog_debug, dlog_warn, Error, Result};

/// Runs real processes, killing any that outlive the timeout.
///
/// Worker threads call [`Runner::run`] concurrently; each call blocks its
/// own thread on a shared runtime that owns process and timer I/O.
pub struct ProcessRunner {
    runtime: Runtime,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("process-io")
            .enable_all()
            .build()?;
        Ok(Self { runtime, timeout })
    }
}

impl Runner for ProcessRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        dlog_debug!("ProcessRunner::run {}", cmd);
        let result = self.runtime.block_on(output_with_timeout(cmd, self.timeout));
        if let Err(Error::Timeout(limit)) = &result {
            dlog_warn!("Command `{}` killed after {:?}", cmd, limit);
        }
        result
    }
}

async fn output_with_timeout(cmd: &CommandSpec, limit: Option<Duration>) -> Result<CommandOutput> {
    let mut command = tokio::process::Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = match limit {
        Some(limit) => match timeout(limit, command.output()).await {
            Ok(output) => output?,
            Err(_) => return Err(Error::Timeout(limit)),
        },
        None => command.output().await?,
    };
    Ok(CommandOutput::from(output))
}
