//! Persisting parsed tables.
//!
//! Every table is written once per format under a results root, one
//! subdirectory per format:
//!
//! ```text
//! <root>/json/<name>.json
//! <root>/xlsx/<name>.xlsx
//! ```
//!
//! Directories are created on demand and existing artifacts are overwritten.

mod json;
mod xlsx;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::table::ParsedTable;

pub use json::save_json;
pub use xlsx::{cell_reference, column_name, save_xlsx};

/// Output formats produced for every parsed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// JSON array of arrays.
    Json,
    /// Single-sheet Excel workbook.
    Xlsx,
}

impl ExportFormat {
    /// Every format, in the order they are written.
    pub const ALL: [Self; 2] = [Self::Json, Self::Xlsx];

    /// Subdirectory of the results root holding this format.
    #[must_use]
    pub const fn directory(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    /// Path of the artifact called `name` under `root`.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use knapsweep_core::export::ExportFormat;
    ///
    /// let path = ExportFormat::Xlsx.artifact_path(Path::new("results"), "result-1-4");
    /// assert_eq!(path, Path::new("results/xlsx/result-1-4.xlsx"));
    /// ```
    #[must_use]
    pub fn artifact_path(self, root: &Path, name: &str) -> PathBuf {
        root.join(self.directory())
            .join(format!("{name}.{}", self.extension()))
    }

    /// Writes `table` in this format.
    ///
    /// # Errors
    /// Returns [`ExportError`] when the directory or artifact cannot be written.
    pub fn save(self, root: &Path, table: &ParsedTable, name: &str) -> Result<PathBuf, ExportError> {
        match self {
            Self::Json => save_json(root, table, name),
            Self::Xlsx => save_xlsx(root, table, name),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Returns `true` when `name` can serve as an artifact base name.
///
/// Names must be non-empty, must not be `.` or `..`, and must not contain
/// path separators, so every artifact stays directly inside its format
/// directory.
///
/// # Examples
/// ```
/// use knapsweep_core::export::is_valid_artifact_name;
///
/// assert!(is_valid_artifact_name("result-3-30-1core"));
/// assert!(!is_valid_artifact_name("../result-3-30"));
/// ```
#[must_use]
pub fn is_valid_artifact_name(name: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']))
}

/// Errors raised while exporting a table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The artifact name would escape its format directory.
    #[error("artifact name `{name}` must be non-empty and free of path separators")]
    InvalidName {
        /// Rejected name.
        name: String,
    },
    /// The format subdirectory could not be created.
    #[error("failed to create directory `{path}`: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The artifact file could not be written.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// Artifact path.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The table could not be encoded as JSON.
    #[error("failed to encode `{path}` as JSON: {source}")]
    Json {
        /// Artifact path.
        path: PathBuf,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// A cell lies beyond the spreadsheet's addressable range.
    #[error("cell at row {row}, column {column} exceeds spreadsheet limits")]
    CellOutOfRange {
        /// Zero-based table row.
        row: usize,
        /// Zero-based table column.
        column: usize,
    },
    /// The workbook rejected a cell value.
    #[error("failed to write cell {cell}: {source}")]
    Workbook {
        /// A1-style cell reference.
        cell: String,
        /// Workbook failure.
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    /// The workbook could not be saved.
    #[error("failed to save workbook `{path}`: {source}")]
    Save {
        /// Artifact path.
        path: PathBuf,
        /// Workbook failure.
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

/// Writes `table` in every [`ExportFormat`] and returns the artifact paths.
///
/// # Errors
/// Returns [`ExportError::InvalidName`] before writing anything when `name`
/// is rejected by [`is_valid_artifact_name`]. Otherwise returns the first
/// [`ExportError`] encountered; formats after the failing one are not
/// written.
pub fn export_all(root: &Path, table: &ParsedTable, name: &str) -> Result<Vec<PathBuf>, ExportError> {
    if !is_valid_artifact_name(name) {
        return Err(ExportError::InvalidName {
            name: name.to_owned(),
        });
    }
    ExportFormat::ALL
        .into_iter()
        .map(|format| {
            let path = format.save(root, table, name)?;
            debug!(%format, path = %path.display(), "artifact exported");
            Ok(path)
        })
        .collect()
}

/// Creates `<root>/<format dir>` and returns the artifact path inside it.
fn prepare_artifact(root: &Path, format: ExportFormat, name: &str) -> Result<PathBuf, ExportError> {
    let dir = root.join(format.directory());
    fs::create_dir_all(&dir).map_err(|source| ExportError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(format.artifact_path(root, name))
}
