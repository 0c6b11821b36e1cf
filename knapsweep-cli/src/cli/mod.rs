//! Command-line interface orchestration for the sweep harness.
//!
//! `run` sweeps the solver across one or more named stages, `stages` lists
//! the stage catalogue, and `export` re-exports a captured solver output.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExportCommand, ExportSummary, RunCommand, RunSummary, StagesCommand,
    Summary, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
