//! Named sweep stages and stage plans.
//!
//! A [`Stage`] fixes every solver parameter except one [`SweepDimension`],
//! which takes each value of its [`SweepValues`] in turn. Stages come from
//! the built-in catalogue ([`builtin_stages`]) or from a JSON [`StagePlan`]:
//!
//! ```json
//! {
//!   "stages": [
//!     {
//!       "id": 3,
//!       "name": "relw-1core",
//!       "base": { "processors": 1, "variant": true },
//!       "dimension": "relative-weight",
//!       "values": { "start": 10, "end": 100, "step": 10 },
//!       "file_suffix": "-1core"
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::iter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::is_valid_artifact_name;
use crate::params::{ParameterPoint, SweepDimension};

/// Processor counts swept by the processor-scaling stages.
const PROCESSOR_COUNTS: [u32; 9] = [1, 2, 4, 6, 8, 10, 12, 14, 16];

/// Inclusive arithmetic range of sweep values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueRange {
    /// First value.
    pub start: u32,
    /// Last value; included when reached by `step`.
    pub end: u32,
    /// Increment between values.
    pub step: u32,
}

impl ValueRange {
    /// Checks that the range yields at least one value.
    ///
    /// # Errors
    /// Returns [`PlanError::ZeroStep`] or [`PlanError::InvertedRange`].
    pub const fn validate(&self) -> Result<(), PlanError> {
        if self.step == 0 {
            return Err(PlanError::ZeroStep);
        }
        if self.start > self.end {
            return Err(PlanError::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    fn iter(self) -> impl Iterator<Item = u32> {
        let Self { start, end, step } = self;
        iter::successors(Some(start), move |current| {
            current.checked_add(step).filter(|next| *next <= end)
        })
    }
}

/// Values taken by a stage's sweep dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SweepValues {
    /// Explicit values, swept in order.
    List(Vec<u32>),
    /// Inclusive arithmetic range.
    Range(ValueRange),
}

impl SweepValues {
    /// Checks the values without expanding them.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the list is empty or the range is invalid.
    pub fn validate(&self) -> Result<(), PlanError> {
        match self {
            Self::List(values) if values.is_empty() => Err(PlanError::EmptyValues),
            Self::List(_) => Ok(()),
            Self::Range(range) => range.validate(),
        }
    }

    /// Yields the values lazily, in sweep order.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the values fail [`SweepValues::validate`].
    ///
    /// # Examples
    /// ```
    /// use knapsweep_core::{SweepValues, ValueRange};
    ///
    /// let values = SweepValues::Range(ValueRange { start: 10, end: 100, step: 10 });
    /// assert_eq!(values.values()?.count(), 10);
    /// # Ok::<(), knapsweep_core::PlanError>(())
    /// ```
    pub fn values(&self) -> Result<Box<dyn Iterator<Item = u32> + '_>, PlanError> {
        self.validate()?;
        Ok(match self {
            Self::List(values) => Box::new(values.iter().copied()),
            Self::Range(range) => Box::new(range.iter()),
        })
    }
}

/// A named sweep over one solver parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stage {
    /// Stage number written to the run log.
    pub id: u32,
    /// Unique name used to select the stage.
    pub name: String,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Parameters shared by every step.
    #[serde(default)]
    pub base: ParameterPoint,
    /// Parameter replaced at each step.
    pub dimension: SweepDimension,
    /// Values taken by `dimension`.
    pub values: SweepValues,
    /// Appended to artifact names, e.g. `-1core`.
    #[serde(default)]
    pub file_suffix: Option<String>,
}

impl Stage {
    /// Checks the stage's values and artifact suffix.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the values are invalid or the suffix would
    /// put artifacts outside their format directory.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.values.validate()?;
        if let Some(suffix) = &self.file_suffix
            && !is_valid_artifact_name(&self.artifact_name(self.id))
        {
            return Err(PlanError::InvalidSuffix {
                suffix: suffix.clone(),
            });
        }
        Ok(())
    }

    /// Yields `(value, point)` for every step, in sweep order.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the stage fails [`Stage::validate`].
    pub fn points(&self) -> Result<impl Iterator<Item = (u32, ParameterPoint)> + '_, PlanError> {
        self.validate()?;
        Ok(self
            .values
            .values()?
            .map(|value| (value, self.base.with(self.dimension, value))))
    }

    /// Base name of the artifacts written for `value`.
    ///
    /// # Examples
    /// ```
    /// use knapsweep_core::builtin_stages;
    ///
    /// let stages = builtin_stages();
    /// let relw = stages.iter().find(|s| s.name == "relw-1core").expect("built in");
    /// assert_eq!(relw.artifact_name(30), "result-3-30-1core");
    /// ```
    #[must_use]
    pub fn artifact_name(&self, value: u32) -> String {
        format!(
            "result-{}-{value}{}",
            self.id,
            self.file_suffix.as_deref().unwrap_or_default()
        )
    }
}

/// Errors raised while loading or resolving stage plans.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file could not be read.
    #[error("failed to read stage plan `{path}`: {source}")]
    Read {
        /// Plan file path.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The plan file is not a valid plan.
    #[error("invalid stage plan `{path}`: {source}")]
    Parse {
        /// Plan file path.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A plan defines no stages.
    #[error("stage plan defines no stages")]
    NoStages,
    /// Two stages share a name.
    #[error("stage name `{name}` is defined more than once")]
    DuplicateStage {
        /// Repeated name.
        name: String,
    },
    /// A requested stage does not exist.
    #[error("unknown stage `{name}`; available: {available}")]
    UnknownStage {
        /// Requested name.
        name: String,
        /// Comma-separated list of defined names.
        available: String,
    },
    /// A value list is empty.
    #[error("sweep values must not be empty")]
    EmptyValues,
    /// A range has a zero step.
    #[error("sweep range step must be greater than zero")]
    ZeroStep,
    /// An artifact suffix contains path separators.
    #[error("file suffix `{suffix}` must not contain path separators")]
    InvalidSuffix {
        /// Rejected suffix.
        suffix: String,
    },
    /// A range ends before it starts.
    #[error("sweep range start {start} exceeds end {end}")]
    InvertedRange {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
    /// A stage has invalid values.
    #[error("stage `{name}` is invalid: {source}")]
    InvalidStage {
        /// Offending stage.
        name: String,
        /// Validation failure.
        #[source]
        source: Box<PlanError>,
    },
}

/// An ordered catalogue of stages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagePlan {
    /// Stages in catalogue order.
    pub stages: Vec<Stage>,
}

impl Default for StagePlan {
    fn default() -> Self {
        Self {
            stages: builtin_stages(),
        }
    }
}

impl StagePlan {
    /// Creates a validated plan.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the plan is empty, names repeat, or a
    /// stage fails [`Stage::validate`].
    pub fn new(stages: Vec<Stage>) -> Result<Self, PlanError> {
        let plan = Self { stages };
        plan.validate()?;
        Ok(plan)
    }

    /// Loads and validates a JSON plan from `path`.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the file cannot be read, decoded, or
    /// validated.
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded: Self = serde_json::from_str(&text).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(decoded.stages)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.stages.is_empty() {
            return Err(PlanError::NoStages);
        }
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name.as_str()) {
                return Err(PlanError::DuplicateStage {
                    name: stage.name.clone(),
                });
            }
            stage.validate().map_err(|source| PlanError::InvalidStage {
                name: stage.name.clone(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }

    /// Resolves `names` in the order given.
    ///
    /// # Errors
    /// Returns [`PlanError::UnknownStage`] for the first name not in the plan.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Stage>, PlanError> {
        names
            .iter()
            .map(AsRef::as_ref)
            .map(|name: &str| {
                self.get(name).ok_or_else(|| PlanError::UnknownStage {
                    name: name.to_owned(),
                    available: self.names().join(", "),
                })
            })
            .collect()
    }

    /// Stage names in catalogue order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name.as_str()).collect()
    }
}

/// The stages of the reference benchmarking campaign.
///
/// All stages solve 25-item instances, 100 iterations per run, with a
/// capacity multiplier of 128.
#[must_use]
pub fn builtin_stages() -> Vec<Stage> {
    let base = ParameterPoint::default();
    let variant = ParameterPoint {
        variant: true,
        ..base
    };
    let relative_weights = SweepValues::Range(ValueRange {
        start: 10,
        end: 100,
        step: 10,
    });
    vec![
        Stage {
            id: 1,
            name: "processors".to_owned(),
            description: "Processor scaling, default solver".to_owned(),
            base,
            dimension: SweepDimension::Processors,
            values: SweepValues::List(PROCESSOR_COUNTS.to_vec()),
            file_suffix: None,
        },
        Stage {
            id: 2,
            name: "processors-variant".to_owned(),
            description: "Processor scaling, alternate solver (-o)".to_owned(),
            base: variant,
            dimension: SweepDimension::Processors,
            values: SweepValues::List(PROCESSOR_COUNTS.to_vec()),
            file_suffix: None,
        },
        Stage {
            id: 3,
            name: "relw-1core".to_owned(),
            description: "Relative weight sweep on one processor (-o)".to_owned(),
            base: ParameterPoint {
                processors: 1,
                ..variant
            },
            dimension: SweepDimension::RelativeWeight,
            values: relative_weights.clone(),
            file_suffix: Some("-1core".to_owned()),
        },
        Stage {
            id: 3,
            name: "relw-16core".to_owned(),
            description: "Relative weight sweep on sixteen processors (-o)".to_owned(),
            base: ParameterPoint {
                processors: 16,
                ..variant
            },
            dimension: SweepDimension::RelativeWeight,
            values: relative_weights,
            file_suffix: None,
        },
    ]
}
