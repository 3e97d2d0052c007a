//! Scripted runner for tests.
//!
//! Responses are matched by substring against the rendered command line, in
//! registration order. Commands with no matching response exit with code 127.

use std::sync::Mutex;
use std::time::Duration;

use crate::runner::{CommandOutput, CommandSpec, Runner};
use crate::{Error, Result};

enum Response {
    Output(CommandOutput),
    Timeout,
}

#[derive(Default)]
pub struct FakeRunner {
    responses: Vec<(String, Response)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern`.
    pub fn respond(mut self, pattern: &str, stdout: &str, stderr: &str, code: i32) -> Self {
        self.responses.push((
            pattern.to_string(),
            Response::Output(CommandOutput {
                success: code == 0,
                code: Some(code),
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            }),
        ));
        self
    }

    /// Make commands containing `pattern` time out.
    pub fn time_out(mut self, pattern: &str) -> Self {
        self.responses.push((pattern.to_string(), Response::Timeout));
        self
    }

    /// Command lines run so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Runner for FakeRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let line = cmd.to_string();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.clone());

        match self.responses.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            Some((_, Response::Output(output))) => Ok(output.clone()),
            Some((_, Response::Timeout)) => Err(Error::Timeout(Duration::ZERO)),
            None => Ok(CommandOutput {
                success: false,
                code: Some(127),
                stdout: Vec::new(),
                stderr: format!("no scripted response for `{}`", line).into_bytes(),
            }),
        }
    }
}
