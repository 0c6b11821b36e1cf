//! Test doubles shared by the core unit tests.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use crate::runner::{CommandRunner, RunnerError, SolverCommand};

/// Runner replaying canned responses in order and recording every command.
///
/// Once the script is exhausted every further call yields empty output.
pub(crate) struct ScriptedRunner {
    responses: VecDeque<Result<String, RunnerError>>,
    commands: Vec<SolverCommand>,
}

impl ScriptedRunner {
    pub(crate) fn new(responses: Vec<Result<String, RunnerError>>) -> Self {
        Self {
            responses: responses.into(),
            commands: Vec::new(),
        }
    }

    pub(crate) fn commands(&self) -> &[SolverCommand] {
        &self.commands
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, command: &SolverCommand) -> Result<String, RunnerError> {
        self.commands.push(command.clone());
        self.responses.pop_front().unwrap_or_else(|| Ok(String::new()))
    }
}

pub(crate) fn spawn_failure() -> RunnerError {
    RunnerError::Spawn {
        program: PathBuf::from("./KnapsackTree"),
        source: io::Error::from(io::ErrorKind::NotFound),
    }
}
