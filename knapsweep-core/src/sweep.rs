//! Sweep driver.
//!
//! Runs one [`Stage`] step by step: render the solver command, time the
//! solver, parse its table, export both artifacts, and append the outcome to
//! the [`RunLog`]. Steps run strictly one after another. A failing step is
//! logged and skipped unless [`SweepSettings::fail_fast`] is set.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use crate::{
    error::{StepError, StepErrorCode, SweepError},
    export::export_all,
    log::RunLog,
    params::ParameterPoint,
    runner::{CommandRunner, SolverCommand},
    stage::Stage,
    table::parse_table,
};

/// Solver path used when none is configured.
pub const DEFAULT_EXECUTABLE: &str = "./KnapsackTree";

/// Results root used when none is configured.
pub const DEFAULT_RESULTS_DIR: &str = "./temp_result_data";

/// Settings shared by every stage of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepSettings {
    /// Solver executable.
    pub executable: PathBuf,
    /// Root directory receiving the `json/` and `xlsx/` artifacts.
    pub results_dir: PathBuf,
    /// Abort the stage on the first failing step.
    pub fail_fast: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            fail_fast: false,
        }
    }
}

/// How a sweep step ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The table was parsed and written in every format.
    Exported {
        /// Rows in the parsed table, header included.
        rows: usize,
        /// Written artifact paths.
        artifacts: Vec<PathBuf>,
    },
    /// The step failed and was skipped.
    Failed {
        /// Stable failure code.
        code: StepErrorCode,
        /// Human-readable failure.
        message: String,
    },
}

/// Result of one sweep step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Value taken by the stage's sweep dimension.
    pub value: u32,
    /// Parameters passed to the solver.
    pub point: ParameterPoint,
    /// Wall time spent in the solver.
    pub elapsed: Duration,
    /// What happened after the solver returned.
    pub outcome: StepOutcome,
}

impl StepReport {
    /// Returns `true` when the step exported its table.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, StepOutcome::Exported { .. })
    }
}

/// Result of running one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name.
    pub stage: String,
    /// Stage number.
    pub stage_id: u32,
    /// Step results in sweep order.
    pub steps: Vec<StepReport>,
}

impl StageReport {
    /// Number of exported steps.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|step| step.succeeded()).count()
    }

    /// Number of failed steps.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }

    /// Total solver wall time across steps.
    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.steps.iter().map(|step| step.elapsed).sum()
    }
}

/// Runs every step of `stage` and records each outcome in `log`.
///
/// # Errors
/// Returns [`SweepError::Plan`] when the stage fails [`Stage::validate`],
/// [`SweepError::Log`] when the run log cannot be written, and
/// [`SweepError::Step`] for the first failing step when
/// [`SweepSettings::fail_fast`] is set.
#[instrument(
    name = "sweep.stage",
    err,
    skip_all,
    fields(stage = %stage.name, id = stage.id, dimension = %stage.dimension),
)]
pub fn run_stage<R, W>(
    runner: &mut R,
    stage: &Stage,
    settings: &SweepSettings,
    log: &mut RunLog<W>,
) -> Result<StageReport, SweepError>
where
    R: CommandRunner + ?Sized,
    W: Write,
{
    let mut steps = Vec::new();

    for (value, point) in stage.points()? {
        let (elapsed, result) = run_step(runner, stage, settings, value, &point);
        let outcome = match result {
            Ok((rows, artifacts)) => {
                log.record_finished(stage.id, elapsed)?;
                info!(
                    stage = stage.id,
                    value,
                    rows,
                    elapsed_s = elapsed.as_secs_f64(),
                    "step finished"
                );
                StepOutcome::Exported { rows, artifacts }
            }
            Err(source) => {
                let message = source.to_string();
                log.record_failed(stage.id, value, &message)?;
                error!(
                    stage = stage.id,
                    value,
                    code = %source.code(),
                    error = %message,
                    "step failed"
                );
                if settings.fail_fast {
                    return Err(SweepError::Step {
                        stage: stage.name.clone(),
                        value,
                        source,
                    });
                }
                StepOutcome::Failed {
                    code: source.code(),
                    message,
                }
            }
        };
        steps.push(StepReport {
            value,
            point,
            elapsed,
            outcome,
        });
    }

    let report = StageReport {
        stage: stage.name.clone(),
        stage_id: stage.id,
        steps,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "stage completed"
    );
    Ok(report)
}

type StepResult = Result<(usize, Vec<PathBuf>), StepError>;

#[instrument(name = "sweep.step", skip_all, fields(stage = %stage.name, value = value))]
fn run_step<R>(
    runner: &mut R,
    stage: &Stage,
    settings: &SweepSettings,
    value: u32,
    point: &ParameterPoint,
) -> (Duration, StepResult)
where
    R: CommandRunner + ?Sized,
{
    let command = SolverCommand::new(&settings.executable, point);
    info!(command = %command, "executing solver");

    let started = Instant::now();
    let output = runner.run(&command);
    let elapsed = started.elapsed();

    let result = output
        .map_err(StepError::from)
        .and_then(|text| export_output(&text, stage, settings, value));
    (elapsed, result)
}

fn export_output(text: &str, stage: &Stage, settings: &SweepSettings, value: u32) -> StepResult {
    let table = parse_table(text);
    if !table.has_header() {
        warn!("solver output contained no result table");
    } else if table.is_empty() {
        warn!("result table has no data rows");
    }
    let ragged = table.ragged_rows();
    if !ragged.is_empty() {
        warn!(rows = ?ragged, "rows differ in width from the header");
    }

    let artifacts = export_all(&settings.results_dir, &table, &stage.artifact_name(value))?;
    Ok((table.len(), artifacts))
}
