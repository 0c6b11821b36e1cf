//! Error types for sweep execution.
//!
//! [`StepError`] describes why a single sweep step failed; [`SweepError`]
//! describes why a whole stage stopped. Both expose stable machine-readable
//! codes for structured logs.

use std::fmt;

use thiserror::Error;

use crate::{export::ExportError, log::LogError, runner::RunnerError};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Failure of a single sweep step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The solver could not be run.
    #[error(transparent)]
    Runner(#[from] RunnerError),
    /// The parsed table could not be exported.
    #[error(transparent)]
    Export(#[from] ExportError),
}

define_error_codes! {
    /// Stable codes describing [`StepError`] variants.
    enum StepErrorCode for StepError {
        /// The solver could not be run.
        Runner => Runner(..) => "SWEEP_RUNNER_FAILURE",
        /// The parsed table could not be exported.
        Export => Export(..) => "SWEEP_EXPORT_FAILURE",
    }
}

/// Reasons a stage stopped before sweeping every value.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The stage's values are invalid.
    #[error(transparent)]
    Plan(#[from] crate::stage::PlanError),
    /// The run log could not be written.
    #[error(transparent)]
    Log(#[from] LogError),
    /// A step failed while fail-fast was enabled.
    #[error("stage `{stage}` failed at value {value}: {source}")]
    Step {
        /// Stage name.
        stage: String,
        /// Sweep value of the failing step.
        value: u32,
        /// Step failure.
        #[source]
        source: StepError,
    },
}

define_error_codes! {
    /// Stable codes describing [`SweepError`] variants.
    enum SweepErrorCode for SweepError {
        /// The stage's values are invalid.
        Plan => Plan(..) => "SWEEP_INVALID_PLAN",
        /// The run log could not be written.
        Log => Log(..) => "SWEEP_LOG_FAILURE",
        /// A step failed while fail-fast was enabled.
        Step => Step { .. } => "SWEEP_STEP_FAILURE",
    }
}

impl SweepError {
    /// Retrieve the inner [`StepErrorCode`] when a step failure stopped the
    /// stage.
    #[must_use]
    pub const fn step_code(&self) -> Option<StepErrorCode> {
        match self {
            Self::Step { source, .. } => Some(source.code()),
            _ => None,
        }
    }
}
