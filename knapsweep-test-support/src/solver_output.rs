//! Synthetic knapsack solver output for parser, exporter, and driver tests.
//!
//! The generated text mirrors what the solver prints: a free-form preamble,
//! a `|`-delimited table header carrying the `ITER` marker, an `x`-joined
//! separator rule, and one `I:`-labelled row per iteration with a trailing
//! delimiter.

use std::fmt::Write as _;

/// Preamble printed by the solver before the result table.
pub const PREAMBLE: &str = "\
National Research Nuclear University \"MEPhI\"
Knapsack packing tree benchmark

Experiment parameters:
---> Task size:       25;
---> Element size:    128;
---> Processor Count: 1;
---> Iteration Count: 100;
---> Codebase Date:   17-10-2021;
Experiment build: Release;

";

/// Output of a run that never reached the result table.
pub const TRUNCATED_OUTPUT: &str = "\
Experiment parameters:
Invalid argument: -q;
";

/// Shape of a synthetic solver table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverTable {
    /// Number of `I:` rows to emit.
    pub iterations: usize,
    /// Number of `Time,ms` columns (one per processor).
    pub processors: usize,
    /// Relative target weight printed in the `RELW, %` column.
    pub relative_weight: u32,
}

impl SolverTable {
    /// Header fields after whitespace removal, in column order.
    #[must_use]
    pub fn expected_header(&self) -> Vec<String> {
        let mut header = vec!["ITER".to_owned(), "RELW,%".to_owned()];
        header.extend(std::iter::repeat_n("Time,ms".to_owned(), self.processors));
        header
    }

    /// Timing value printed for `iteration` on processor `processor`.
    #[must_use]
    pub const fn timing(iteration: usize, processor: usize) -> usize {
        100 + iteration * 7 + processor * 3
    }

    /// Renders the table exactly as the solver would print it, including
    /// the preamble.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(PREAMBLE);
        out.push_str("ITER   |RELW, %|");
        for _ in 0..self.processors {
            out.push_str("Time,ms|");
        }
        out.push('\n');
        out.push_str("-------x-------x");
        for _ in 0..self.processors {
            out.push_str("-------x");
        }
        out.push('\n');
        for iteration in 0..self.iterations {
            let _ = write!(out, "I:{iteration:5}| {:6}| ", self.relative_weight);
            for processor in 0..self.processors {
                let _ = write!(out, "{:6}| ", Self::timing(iteration, processor));
            }
            out.push('\n');
        }
        out
    }
}

/// Shorthand for [`SolverTable::render`].
#[must_use]
pub fn solver_output(iterations: usize, processors: usize, relative_weight: u32) -> String {
    SolverTable {
        iterations,
        processors,
        relative_weight,
    }
    .render()
}
