//! Solver parameter points and the command-line switches they render to.
//!
//! A [`ParameterPoint`] is one cell of a sweep grid. The solver accepts it as
//! `-n <size> -i <iterations> -p <processors> -m <multiplier> [-r <weight>] [-o]`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Problem size used when a stage does not override it.
pub const DEFAULT_PROBLEM_SIZE: u32 = 25;
/// Iteration count used when a stage does not override it.
pub const DEFAULT_ITERATIONS: u32 = 100;
/// Processor count used when a stage does not override it.
pub const DEFAULT_PROCESSORS: u32 = 1;
/// Capacity multiplier used when a stage does not override it.
pub const DEFAULT_CAPACITY_MULTIPLIER: u32 = 128;

/// One set of solver parameters.
///
/// # Examples
/// ```
/// use knapsweep_core::ParameterPoint;
///
/// let point = ParameterPoint {
///     relative_weight: Some(40),
///     variant: true,
///     ..ParameterPoint::default()
/// };
/// assert_eq!(point.to_string(), "-n 25 -i 100 -p 1 -m 128 -r 40 -o");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterPoint {
    /// Number of knapsack items (`-n`).
    pub problem_size: u32,
    /// Number of random instances solved per run (`-i`).
    pub iterations: u32,
    /// Worker thread count (`-p`).
    pub processors: u32,
    /// Capacity multiplier (`-m`).
    pub capacity_multiplier: u32,
    /// Fixed relative target weight in percent (`-r`); random when absent.
    pub relative_weight: Option<u32>,
    /// Selects the alternate solver variant (`-o`).
    pub variant: bool,
}

impl Default for ParameterPoint {
    fn default() -> Self {
        Self {
            problem_size: DEFAULT_PROBLEM_SIZE,
            iterations: DEFAULT_ITERATIONS,
            processors: DEFAULT_PROCESSORS,
            capacity_multiplier: DEFAULT_CAPACITY_MULTIPLIER,
            relative_weight: None,
            variant: false,
        }
    }
}

impl ParameterPoint {
    /// Returns a copy with `dimension` set to `value`.
    #[must_use]
    pub const fn with(self, dimension: SweepDimension, value: u32) -> Self {
        let mut point = self;
        match dimension {
            SweepDimension::ProblemSize => point.problem_size = value,
            SweepDimension::Iterations => point.iterations = value,
            SweepDimension::Processors => point.processors = value,
            SweepDimension::CapacityMultiplier => point.capacity_multiplier = value,
            SweepDimension::RelativeWeight => point.relative_weight = Some(value),
        }
        point
    }

    /// Renders the solver switches in canonical order.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-n".to_owned(),
            self.problem_size.to_string(),
            "-i".to_owned(),
            self.iterations.to_string(),
            "-p".to_owned(),
            self.processors.to_string(),
            "-m".to_owned(),
            self.capacity_multiplier.to_string(),
        ];
        if let Some(weight) = self.relative_weight {
            args.push("-r".to_owned());
            args.push(weight.to_string());
        }
        if self.variant {
            args.push("-o".to_owned());
        }
        args
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

/// The parameter a stage varies across its sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepDimension {
    /// Vary `-n`.
    ProblemSize,
    /// Vary `-i`.
    Iterations,
    /// Vary `-p`.
    Processors,
    /// Vary `-m`.
    CapacityMultiplier,
    /// Vary `-r`.
    RelativeWeight,
}

impl SweepDimension {
    /// Returns a stable kebab-case identifier for logs and plan files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProblemSize => "problem-size",
            Self::Iterations => "iterations",
            Self::Processors => "processors",
            Self::CapacityMultiplier => "capacity-multiplier",
            Self::RelativeWeight => "relative-weight",
        }
    }
}

impl fmt::Display for SweepDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
