//! Command implementations and argument parsing for the `knapsweep` CLI.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use knapsweep_core::{
    DEFAULT_EXECUTABLE, DEFAULT_RESULTS_DIR, LogError, PlanError, ProcessRunner, RunLog, Stage,
    StageReport, StagePlan, StepErrorCode, StepOutcome, SweepError, SweepSettings, SweepValues,
    export::{ExportError, export_all, is_valid_artifact_name},
    parse_table, run_stage,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

const DEFAULT_LOG_FILE: &str = "log.txt";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "knapsweep",
    about = "Sweep a knapsack solver across parameter grids and export its result tables."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run one or more sweep stages against the solver.
    Run(RunCommand),
    /// List the available sweep stages.
    Stages(StagesCommand),
    /// Parse a captured solver output file and export its table.
    Export(ExportCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Stage names to run, in order.
    #[arg(long = "stage", required = true, num_args = 1..)]
    pub stages: Vec<String>,

    /// JSON stage plan replacing the built-in catalogue.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Solver executable.
    #[arg(long, default_value = DEFAULT_EXECUTABLE)]
    pub executable: PathBuf,

    /// Directory receiving the `json/` and `xlsx/` artifacts.
    #[arg(long = "results-dir", default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Run log appended with one line per step.
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Stop at the first failing step.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

/// Options accepted by the `stages` command.
#[derive(Debug, Args, Clone)]
pub struct StagesCommand {
    /// JSON stage plan replacing the built-in catalogue.
    #[arg(long)]
    pub plan: Option<PathBuf>,
}

/// Options accepted by the `export` command.
#[derive(Debug, Args, Clone)]
pub struct ExportCommand {
    /// File holding captured solver stdout.
    pub input: PathBuf,

    /// Artifact base name, e.g. `result-3-30-1core`.
    #[arg(long)]
    pub name: String,

    /// Directory receiving the `json/` and `xlsx/` artifacts.
    #[arg(long = "results-dir", default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A captured output file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An artifact name would escape the results directory.
    #[error("artifact name `{name}` must be non-empty and free of path separators")]
    InvalidName {
        /// Rejected name.
        name: String,
    },
    /// The stage plan could not be loaded or resolved.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The run log could not be opened.
    #[error(transparent)]
    Log(#[from] LogError),
    /// A stage stopped early.
    #[error(transparent)]
    Sweep(#[from] SweepError),
    /// Artifacts could not be written.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CliError {
    /// Stable machine-readable code for structured logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CLI_INPUT_UNREADABLE",
            Self::InvalidName { .. } => "CLI_INVALID_ARTIFACT_NAME",
            Self::Plan(_) => "CLI_INVALID_PLAN",
            Self::Log(_) => "CLI_LOG_FAILURE",
            Self::Sweep(sweep) => sweep.code().as_str(),
            Self::Export(_) => "CLI_EXPORT_FAILURE",
        }
    }

    /// Code of the step that stopped a fail-fast sweep, if any.
    #[must_use]
    pub const fn step_code(&self) -> Option<StepErrorCode> {
        match self {
            Self::Sweep(sweep) => sweep.step_code(),
            _ => None,
        }
    }
}

/// Outcome of a `run` command.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Stage reports in execution order.
    pub reports: Vec<StageReport>,
    /// Run log that received the step lines.
    pub log_file: PathBuf,
}

/// Outcome of an `export` command.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Artifact base name.
    pub name: String,
    /// Rows in the exported table, header included.
    pub rows: usize,
    /// Written artifact paths.
    pub artifacts: Vec<PathBuf>,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub enum Summary {
    /// Stages swept by `run`.
    Run(RunSummary),
    /// Catalogue listed by `stages`.
    Stages(Vec<Stage>),
    /// Artifacts written by `export`.
    Export(ExportSummary),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when a plan, log, input file, or stage fails.
///
/// # Examples
/// ```
/// # use knapsweep_cli::cli::{Cli, Command, StagesCommand, Summary, run_cli};
/// let cli = Cli {
///     command: Command::Stages(StagesCommand { plan: None }),
/// };
/// let Summary::Stages(stages) = run_cli(cli)? else {
///     panic!("stages command yields a catalogue");
/// };
/// assert_eq!(stages.len(), 4);
/// # Ok::<(), knapsweep_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<Summary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Run(run) => {
            span.record("command", field::display("run"));
            run_sweep(run).map(Summary::Run)
        }
        Command::Stages(stages) => {
            span.record("command", field::display("stages"));
            list_stages(stages.plan.as_deref()).map(Summary::Stages)
        }
        Command::Export(export) => {
            span.record("command", field::display("export"));
            run_export(export).map(Summary::Export)
        }
    }
}

#[instrument(
    name = "cli.sweep",
    err,
    skip(command),
    fields(stages = field::Empty, plan = field::Empty),
)]
pub(super) fn run_sweep(command: RunCommand) -> Result<RunSummary, CliError> {
    let span = Span::current();
    span.record("stages", field::display(command.stages.join(",")));
    span.record(
        "plan",
        field::display(
            command
                .plan
                .as_deref()
                .map_or_else(|| "<built-in>".to_owned(), |path| path.display().to_string()),
        ),
    );

    let plan = load_plan(command.plan.as_deref())?;
    let stages = plan.select(&command.stages)?;
    let settings = SweepSettings {
        executable: command.executable,
        results_dir: command.results_dir,
        fail_fast: command.fail_fast,
    };
    let mut log = RunLog::open(&command.log_file)?;
    let mut runner = ProcessRunner::new();

    let mut reports = Vec::with_capacity(stages.len());
    for stage in stages {
        reports.push(run_stage(&mut runner, stage, &settings, &mut log)?);
    }

    info!(
        stages = reports.len(),
        failed_steps = reports.iter().map(StageReport::failed).sum::<usize>(),
        "command completed"
    );
    Ok(RunSummary {
        reports,
        log_file: command.log_file,
    })
}

#[instrument(name = "cli.stages", err)]
pub(super) fn list_stages(plan: Option<&Path>) -> Result<Vec<Stage>, CliError> {
    Ok(load_plan(plan)?.stages)
}

#[instrument(
    name = "cli.export",
    err,
    skip(command),
    fields(input = %command.input.display(), name = %command.name),
)]
pub(super) fn run_export(command: ExportCommand) -> Result<ExportSummary, CliError> {
    let ExportCommand {
        input,
        name,
        results_dir,
    } = command;
    validate_name(&name)?;
    let text = fs::read_to_string(&input).map_err(|source| CliError::Io {
        path: input.clone(),
        source,
    })?;

    let table = parse_table(&text);
    if !table.has_header() {
        warn!("input contained no result table");
    }
    let artifacts = export_all(&results_dir, &table, &name)?;
    info!(rows = table.len(), "export completed");
    Ok(ExportSummary {
        name,
        rows: table.len(),
        artifacts,
    })
}

fn load_plan(path: Option<&Path>) -> Result<StagePlan, PlanError> {
    path.map_or_else(|| Ok(StagePlan::default()), StagePlan::from_path)
}

pub(super) fn validate_name(name: &str) -> Result<(), CliError> {
    if !is_valid_artifact_name(name) {
        return Err(CliError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

pub(super) fn describe_values(values: &SweepValues) -> String {
    match values {
        SweepValues::List(list) => list
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        SweepValues::Range(range) => {
            format!("{}..={} step {}", range.start, range.end, range.step)
        }
    }
}

/// Renders `summary` to `writer` as plain text.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use knapsweep_cli::cli::{ExportSummary, Summary, render_summary};
/// let summary = Summary::Export(ExportSummary {
///     name: "result-1-4".into(),
///     rows: 101,
///     artifacts: vec!["out/json/result-1-4.json".into()],
/// });
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(
///     String::from_utf8_lossy(&buffer),
///     "export result-1-4: 101 rows\n  out/json/result-1-4.json\n"
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &Summary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        Summary::Run(run) => {
            for report in &run.reports {
                render_stage_report(report, &mut writer)?;
            }
            writeln!(writer, "log: {}", run.log_file.display())?;
        }
        Summary::Stages(stages) => {
            for stage in stages {
                writeln!(
                    writer,
                    "{}\tstage {}\t{}\t{}\t{}",
                    stage.name,
                    stage.id,
                    stage.dimension,
                    describe_values(&stage.values),
                    stage.description
                )?;
            }
        }
        Summary::Export(export) => {
            writeln!(writer, "export {}: {} rows", export.name, export.rows)?;
            for path in &export.artifacts {
                writeln!(writer, "  {}", path.display())?;
            }
        }
    }
    Ok(())
}

fn render_stage_report(report: &StageReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "stage {} ({}): {} exported, {} failed, {:.3} s",
        report.stage,
        report.stage_id,
        report.succeeded(),
        report.failed(),
        report.total_elapsed().as_secs_f64()
    )?;
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Exported { rows, .. } => writeln!(
                writer,
                "  {}\t{:.3} s\t{rows} rows",
                step.value,
                step.elapsed.as_secs_f64()
            )?,
            StepOutcome::Failed { code, message } => {
                writeln!(writer, "  {}\tFAILED {code}: {message}", step.value)?;
            }
        }
    }
    Ok(())
}
