//! Knapsweep core library.
//!
//! Drives an external knapsack solver across parameter sweeps: each sweep
//! step renders the solver switches, captures the solver's stdout, parses
//! its `|`-delimited result table, and exports the table as JSON and as a
//! spreadsheet under a results directory.

mod error;
pub mod export;
mod log;
mod params;
mod runner;
mod stage;
mod sweep;
mod table;

#[cfg(test)]
mod test_utils;

pub use crate::{
    error::{StepError, StepErrorCode, SweepError, SweepErrorCode},
    log::{LogError, RunLog},
    params::{ParameterPoint, SweepDimension},
    runner::{CommandRunner, ProcessRunner, RunnerError, SolverCommand},
    stage::{PlanError, Stage, StagePlan, SweepValues, ValueRange, builtin_stages},
    sweep::{
        DEFAULT_EXECUTABLE, DEFAULT_RESULTS_DIR, StageReport, StepOutcome, StepReport, SweepSettings,
        run_stage,
    },
    table::{FIELD_DELIMITER, HEADER_MARKER, ParsedTable, ROW_LABEL_PREFIX, parse_table},
};
