//! Solver invocation.
//!
//! [`CommandRunner`] is the seam between the sweep driver and the external
//! solver. [`ProcessRunner`] spawns the solver directly, without a shell,
//! and captures its standard output in memory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{Span, debug, field, instrument};

use crate::params::ParameterPoint;

/// Upper bound on the stderr excerpt kept in [`RunnerError::NonZeroExit`].
const STDERR_EXCERPT_CHARS: usize = 512;

/// A fully rendered solver command line.
///
/// # Examples
/// ```
/// use knapsweep_core::{ParameterPoint, SolverCommand};
///
/// let command = SolverCommand::new("./KnapsackTree", &ParameterPoint::default());
/// assert_eq!(command.to_string(), "./KnapsackTree -n 25 -i 100 -p 1 -m 128");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl SolverCommand {
    /// Builds the command for `point` against the solver at `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, point: &ParameterPoint) -> Self {
        Self {
            program: program.into(),
            args: point.to_args(),
        }
    }

    /// Path of the solver executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the solver.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for SolverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Errors raised while running the solver.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The solver could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Executable that failed to start.
        program: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The solver exited unsuccessfully.
    #[error("`{program}` exited with {}: {stderr}", describe_exit(.code))]
    NonZeroExit {
        /// Executable that failed.
        program: PathBuf,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Leading part of the solver's stderr.
        stderr: String,
    },
    /// The solver wrote bytes to stdout that are not valid UTF-8.
    #[error("`{program}` produced non UTF-8 output")]
    InvalidUtf8 {
        /// Executable that produced the output.
        program: PathBuf,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "no exit code (terminated by signal)".to_owned(),
        |code| format!("status {code}"),
    )
}

/// Executes solver commands and returns their captured stdout.
pub trait CommandRunner {
    /// Runs `command` to completion and returns everything it printed to
    /// stdout.
    ///
    /// # Errors
    /// Returns [`RunnerError`] when the solver cannot be started, fails, or
    /// prints output that cannot be decoded.
    fn run(&mut self, command: &SolverCommand) -> Result<String, RunnerError>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    /// Creates a runner that starts the solver in the current directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { working_dir: None }
    }

    /// Starts the solver in `dir` instead of the current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl CommandRunner for ProcessRunner {
    #[instrument(
        name = "runner.run",
        err,
        skip(self, command),
        fields(command = %command, bytes = field::Empty),
    )]
    fn run(&mut self, command: &SolverCommand) -> Result<String, RunnerError> {
        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            process.current_dir(dir);
        }

        let output = process.output().map_err(|source| RunnerError::Spawn {
            program: command.program().to_path_buf(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunnerError::NonZeroExit {
                program: command.program().to_path_buf(),
                code: output.status.code(),
                stderr: stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| RunnerError::InvalidUtf8 {
            program: command.program().to_path_buf(),
        })?;
        Span::current().record("bytes", stdout.len());
        debug!(output = %stdout, "solver finished");
        Ok(stdout)
    }
}
