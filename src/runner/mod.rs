//! External command execution.
//!
//! Tasks never spawn processes directly; they go through a [`Runner`] so
//! the real implementation ([`ProcessRunner`]) can be swapped for a scripted
//! one ([`testing::FakeRunner`]).

mod process;
pub mod testing;

pub use process::ProcessRunner;

use std::path::Path;

use crate::naming::write_file;
use crate::{dlog_trace, Error, Result};

/// Program plus arguments, never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", shell_escape(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(arg))?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`].
    pub fn check(self, cmd: &CommandSpec) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(Error::CommandFailed {
            command: cmd.to_string(),
            code: self.code,
            stderr: self.stderr_str(),
        })
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs external commands synchronously from inside a task.
pub trait Runner: Send + Sync {
    /// Run `cmd` and capture its output.
    ///
    /// A non-zero exit is not an error at this level; see
    /// [`CommandOutput::check`]. Failing to start the process or timing out
    /// is.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;
}

/// Run `cmd`, write its stdout to `out` and any stderr to `err_out`, then
/// fail if the command exited non-zero.
pub fn run_to_files(runner: &dyn Runner, cmd: &CommandSpec, out: &Path, err_out: &Path) -> Result<()> {
    let output = runner.run(cmd)?;
    dlog_trace!(
        "{}: {} bytes stdout, {} bytes stderr",
        cmd,
        output.stdout.len(),
        output.stderr.len()
    );
    write_file(out, &output.stdout)?;
    if !output.stderr.is_empty() {
        write_file(err_out, &output.stderr)?;
    }
    output.check(cmd).map(|_| ())
}

fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || "-_./=:,{}[]*@".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
