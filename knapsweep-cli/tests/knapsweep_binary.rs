//! Behavioural tests for the `knapsweep` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use knapsweep_test_support::solver_output::solver_output;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_knapsweep"));
        command
            .args(args)
            .current_dir(self.path())
            .env_remove("KNAPSWEEP_LOG_FORMAT")
            .env("RUST_LOG", "info");
        for (key, value) in env {
            command.env(key, value);
        }
        match command.output() {
            Ok(output) => output,
            Err(err) => panic!("failed to run knapsweep: {err}"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Err(err) = fs::write(&path, contents) {
            panic!("failed to write {name}: {err}");
        }
        path
    }
}

#[fixture]
fn harness() -> Harness {
    match TempDir::new() {
        Ok(dir) => Harness { dir },
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[rstest]
fn stages_lists_catalogue_on_stdout(harness: Harness) {
    let output = harness.run(&["stages"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let listing = stdout(&output);
    let names: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(
        names,
        vec!["processors", "processors-variant", "relw-1core", "relw-16core"]
    );
}

#[rstest]
fn unknown_stage_exits_with_failure_and_code(harness: Harness) {
    let output = harness.run(&["run", "--stage", "stage9"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let diagnostics = stderr(&output);
    assert!(diagnostics.contains("command execution failed"));
    assert!(diagnostics.contains("CLI_INVALID_PLAN"));
    assert!(diagnostics.contains("stage9"));
}

#[rstest]
fn unsupported_log_format_is_rejected(harness: Harness) {
    let output = harness.run_with_env(&["stages"], &[("KNAPSWEEP_LOG_FORMAT", "xml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unsupported log format `xml`"));
}

#[rstest]
fn export_writes_artifacts_under_results_dir(harness: Harness) {
    harness.write("captured.txt", &solver_output(4, 2, 30));
    let output = harness.run_with_env(
        &["export", "captured.txt", "--name", "result-3-30-1core"],
        &[("KNAPSWEEP_LOG_FORMAT", "json")],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).lines().count(), 3, "summary and two artifact paths");
    assert!(stdout(&output).starts_with("export result-3-30-1core: 5 rows\n"));
    let diagnostics = stderr(&output);
    assert!(diagnostics.contains(r#""message":"export completed""#));
    for line in diagnostics.lines() {
        if let Err(err) = serde_json::from_str::<serde_json::Value>(line) {
            panic!("stderr line is not JSON ({err}): {line}");
        }
    }

    let results = harness.path().join("temp_result_data");
    assert!(results.join("json/result-3-30-1core.json").is_file());
    assert!(results.join("xlsx/result-3-30-1core.xlsx").is_file());
}

#[cfg(unix)]
#[rstest]
fn run_with_default_paths_writes_artifacts_and_log(harness: Harness) {
    use std::os::unix::fs::PermissionsExt;

    let solver = harness.write(
        "KnapsackTree",
        &format!("#!/bin/sh\ncat <<'TABLE'\n{}TABLE\n", solver_output(2, 1, 10)),
    );
    if let Err(err) = fs::set_permissions(&solver, fs::Permissions::from_mode(0o755)) {
        panic!("failed to mark solver executable: {err}");
    }

    let output = harness.run(&["run", "--stage", "processors-variant"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("stage processors-variant (2): 9 exported, 0 failed, "));
    assert!(stderr(&output).contains("./KnapsackTree -n 25 -i 100 -p 16 -m 128 -o"));

    let results = harness.path().join("temp_result_data");
    for processors in [1, 2, 4, 6, 8, 10, 12, 14, 16] {
        assert!(results.join(format!("json/result-2-{processors}.json")).is_file());
    }
    let log = fs::read_to_string(harness.path().join("log.txt")).unwrap_or_default();
    assert_eq!(log.lines().count(), 9);
}

#[cfg(unix)]
#[rstest]
fn failing_solver_still_exits_zero_without_fail_fast(harness: Harness) {
    use std::os::unix::fs::PermissionsExt;

    let solver = harness.write("KnapsackTree", "#!/bin/sh\necho 'bad switch' >&2\nexit 4\n");
    if let Err(err) = fs::set_permissions(&solver, fs::Permissions::from_mode(0o755)) {
        panic!("failed to mark solver executable: {err}");
    }

    let output = harness.run(&["run", "--stage", "relw-16core"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("stage relw-16core (3): 0 exported, 10 failed, "));
    assert!(stdout(&output).contains("FAILED SWEEP_RUNNER_FAILURE"));

    let fail_fast = harness.run(&["run", "--stage", "relw-16core", "--fail-fast"]);
    assert_eq!(fail_fast.status.code(), Some(1));
    assert!(stderr(&fail_fast).contains("SWEEP_STEP_FAILURE"));
}
