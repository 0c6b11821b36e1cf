//! Append-only run log.
//!
//! One line per finished or failed sweep step, e.g.
//! `Stage 3 Finished! Elapsed: 12.5 s!`. The log is kept separate from the
//! `tracing` diagnostics so it survives across invocations.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`RunLog`].
#[derive(Debug, Error)]
pub enum LogError {
    /// The log file could not be opened.
    #[error("failed to open run log `{path}`: {source}")]
    Open {
        /// Log file path.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A log line could not be written.
    #[error("failed to write run log: {0}")]
    Write(#[from] io::Error),
}

/// Run log writing to any [`Write`] sink.
///
/// The sink is owned by the log and released when the log is dropped.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use knapsweep_core::RunLog;
///
/// let mut log = RunLog::new(Vec::new());
/// log.record_finished(3, Duration::from_millis(1500))?;
/// assert_eq!(log.into_inner(), b"Stage 3 Finished! Elapsed: 1.5 s!\n");
/// # Ok::<(), knapsweep_core::LogError>(())
/// ```
#[derive(Debug)]
pub struct RunLog<W: Write> {
    sink: W,
}

impl RunLog<File> {
    /// Opens `path` for appending, creating it when missing.
    ///
    /// # Errors
    /// Returns [`LogError::Open`] when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RunLog<W> {
    /// Wraps `sink`.
    #[must_use]
    pub const fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Records a step that completed in `elapsed`.
    ///
    /// # Errors
    /// Returns [`LogError::Write`] when the line cannot be written.
    pub fn record_finished(&mut self, stage_id: u32, elapsed: Duration) -> Result<(), LogError> {
        self.write_line(&format!(
            "Stage {stage_id} Finished! Elapsed: {} s!",
            elapsed.as_secs_f64()
        ))
    }

    /// Records a step that failed at sweep `value`.
    ///
    /// # Errors
    /// Returns [`LogError::Write`] when the line cannot be written.
    pub fn record_failed(&mut self, stage_id: u32, value: u32, reason: &str) -> Result<(), LogError> {
        let single_line = reason.replace(['\r', '\n'], " ");
        self.write_line(&format!(
            "Stage {stage_id} Failed! Value: {value}; Reason: {single_line}"
        ))
    }

    fn write_line(&mut self, line: &str) -> Result<(), LogError> {
        writeln!(self.sink, "{line}")?;
        self.sink.flush()?;
        Ok(())
    }

    /// Returns the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink
    }
}
