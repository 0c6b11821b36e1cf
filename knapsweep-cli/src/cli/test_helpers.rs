//! Small helpers shared across CLI tests.
//!
//! The CLI tests build temporary captured outputs, stand-in solvers, and run
//! commands. These helpers keep the test cases concise.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{Cli, CliError, Command, RunCommand, run_cli};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Writes an executable shell script printing `stdout` to `dir/name`.
#[cfg(unix)]
pub(super) fn create_solver(dir: &TempDir, name: &str, stdout: &str) -> io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let script = format!("#!/bin/sh\ncat <<'TABLE'\n{stdout}TABLE\n");
    let path = create_file(dir, name, &script)?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// `run` command with every path rooted in `root`.
pub(super) fn run_command(root: &Path, executable: PathBuf, stages: &[&str]) -> RunCommand {
    RunCommand {
        stages: stages.iter().map(|stage| (*stage).to_owned()).collect(),
        plan: None,
        executable,
        results_dir: root.join("results"),
        log_file: root.join("log.txt"),
        fail_fast: false,
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

pub(super) fn run_expecting_error(command: RunCommand, panic_msg: &str) -> CliError {
    run_cli_expecting_error(
        Cli {
            command: Command::Run(command),
        },
        panic_msg,
    )
}
