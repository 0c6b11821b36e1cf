//! Behavioural tests driving a stage against a real solver process.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use knapsweep_core::{
    ParameterPoint, ProcessRunner, RunLog, Stage, StepErrorCode, StepOutcome, SweepDimension,
    SweepSettings, SweepValues, run_stage,
};
use knapsweep_test_support::solver_output::solver_output;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct FakeSolver {
    dir: TempDir,
    executable: PathBuf,
}

impl FakeSolver {
    fn settings(&self) -> SweepSettings {
        SweepSettings {
            executable: self.executable.clone(),
            results_dir: self.dir.path().join("temp_result_data"),
            fail_fast: false,
        }
    }
}

/// Solver printing a two-row table. Two processors exit with status 3 and six
/// processors print bytes that are not UTF-8.
#[fixture]
fn fake_solver() -> FakeSolver {
    let dir = TempDir::new().expect("temp dir");
    let executable = dir.path().join("KnapsackTree");
    let script = format!(
        "#!/bin/sh\nif [ \"$6\" = \"2\" ]; then\n  echo 'Processor count rejected' >&2\n  exit 3\nfi\nif [ \"$6\" = \"6\" ]; then\n  printf '\\377\\376ITER|\\n'\n  exit 0\nfi\ncat <<'TABLE'\n{}TABLE\n",
        solver_output(2, 1, 40)
    );
    fs::write(&executable, script).expect("script must be written");
    fs::set_permissions(&executable, fs::Permissions::from_mode(0o755))
        .expect("script must be executable");
    FakeSolver { dir, executable }
}

fn processor_stage() -> Stage {
    Stage {
        id: 1,
        name: "processors".to_owned(),
        description: String::new(),
        base: ParameterPoint::default(),
        dimension: SweepDimension::Processors,
        values: SweepValues::List(vec![1, 2, 4]),
        file_suffix: None,
    }
}

#[rstest]
fn stage_exports_successes_and_logs_failures(fake_solver: FakeSolver) {
    let settings = fake_solver.settings();
    let log_path = fake_solver.dir.path().join("log.txt");
    let mut log = RunLog::open(&log_path).expect("log must open");

    let report = run_stage(&mut ProcessRunner::new(), &processor_stage(), &settings, &mut log)
        .expect("stage must complete");
    drop(log);

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    match &report.steps[1].outcome {
        StepOutcome::Failed { code, message } => {
            assert_eq!(*code, StepErrorCode::Runner);
            assert!(message.contains("status 3"));
            assert!(message.contains("Processor count rejected"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let json = fs::read_to_string(settings.results_dir.join("json/result-1-4.json"))
        .expect("json artifact");
    let rows: Vec<Vec<String>> = serde_json::from_str(&json).expect("valid json");
    assert_eq!(rows[0], ["ITER", "RELW,%", "Time,ms"]);
    assert_eq!(rows[1], ["0", "40", "100"]);
    assert!(settings.results_dir.join("xlsx/result-1-1.xlsx").is_file());
    assert!(!settings.results_dir.join("xlsx/result-1-2.xlsx").exists());

    let log_text = fs::read_to_string(&log_path).expect("log must be readable");
    let lines: Vec<&str> = log_text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Stage 1 Finished! Elapsed: "));
    assert!(lines[1].starts_with("Stage 1 Failed! Value: 2; Reason: "));
    assert!(lines[2].starts_with("Stage 1 Finished! Elapsed: "));
}

#[rstest]
fn rerunning_a_stage_overwrites_artifacts_and_appends_log(fake_solver: FakeSolver) {
    let settings = fake_solver.settings();
    let log_path = fake_solver.dir.path().join("log.txt");
    let stage = Stage {
        values: SweepValues::List(vec![4]),
        ..processor_stage()
    };

    for _ in 0..2 {
        let mut log = RunLog::open(&log_path).expect("log must open");
        run_stage(&mut ProcessRunner::new(), &stage, &settings, &mut log)
            .expect("stage must complete");
    }

    let json_dir = settings.results_dir.join("json");
    assert_eq!(fs::read_dir(&json_dir).expect("json dir").count(), 1);
    let log_text = fs::read_to_string(&log_path).expect("log must be readable");
    assert_eq!(log_text.lines().count(), 2);
}

#[rstest]
fn non_utf8_output_fails_only_its_step(fake_solver: FakeSolver) {
    let settings = fake_solver.settings();
    let stage = Stage {
        values: SweepValues::List(vec![6, 4]),
        ..processor_stage()
    };
    let mut log = RunLog::new(Vec::new());

    let report = run_stage(&mut ProcessRunner::new(), &stage, &settings, &mut log)
        .expect("stage must complete");

    match &report.steps[0].outcome {
        StepOutcome::Failed { code, message } => {
            assert_eq!(*code, StepErrorCode::Runner);
            assert!(message.contains("non UTF-8 output"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(report.steps[1].outcome, StepOutcome::Exported { .. }));
    assert!(!settings.results_dir.join("json/result-1-6.json").exists());
    assert!(settings.results_dir.join("json/result-1-4.json").is_file());

    let log_text = String::from_utf8(log.into_inner()).expect("UTF-8 log");
    assert!(log_text.starts_with("Stage 1 Failed! Value: 6; Reason: "));
}
