//! JSON artifact writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use super::{ExportError, ExportFormat, prepare_artifact};
use crate::table::ParsedTable;

/// Writes `table` to `<root>/json/<name>.json` as an array of arrays,
/// header first.
///
/// Rows of differing widths are written as they are.
///
/// # Errors
/// Returns [`ExportError`] when the directory cannot be created or the file
/// cannot be written.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use knapsweep_core::{export::save_json, parse_table};
///
/// let dir = tempfile::tempdir()?;
/// let table = parse_table("ITER|A|\nI:0|1|\n");
/// let path = save_json(dir.path(), &table, "demo")?;
/// assert_eq!(std::fs::read_to_string(path)?, r#"[["ITER","A"],["0","1"]]"#);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "export.json", err, skip(table), fields(rows = table.len()))]
pub fn save_json(root: &Path, table: &ParsedTable, name: &str) -> Result<PathBuf, ExportError> {
    let path = prepare_artifact(root, ExportFormat::Json, name)?;
    let file = File::create(&path).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table).map_err(|source| ExportError::Json {
        path: path.clone(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "json artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use knapsweep_test_support::solver_output::solver_output;
    use rstest::rstest;
    use tempfile::TempDir;

    use crate::table::parse_table;

    fn read_back(path: &Path) -> Vec<Vec<String>> {
        let text = fs::read_to_string(path).expect("artifact must be readable");
        serde_json::from_str(&text).expect("artifact must be JSON")
    }

    #[rstest]
    fn round_trips_solver_table() {
        let dir = TempDir::new().expect("temp dir");
        let table = parse_table(&solver_output(5, 4, 30));
        let path = save_json(dir.path(), &table, "result-2-4").expect("export must succeed");
        assert_eq!(path, dir.path().join("json").join("result-2-4.json"));
        assert_eq!(read_back(&path), table.to_rows());
    }

    #[rstest]
    fn overwrites_existing_artifact() {
        let dir = TempDir::new().expect("temp dir");
        let first = parse_table(&solver_output(8, 2, 10));
        let second = parse_table(&solver_output(1, 1, 20));
        save_json(dir.path(), &first, "same").expect("first export");
        let path = save_json(dir.path(), &second, "same").expect("second export");
        assert_eq!(read_back(&path), second.to_rows());
    }

    #[rstest]
    fn writes_ragged_and_degenerate_tables_verbatim() {
        let dir = TempDir::new().expect("temp dir");
        let ragged = parse_table("ITER|A|B|\nI:0|1|\n");
        let path = save_json(dir.path(), &ragged, "ragged").expect("ragged export");
        assert_eq!(read_back(&path), vec![vec!["ITER", "A", "B"], vec!["0", "1"]]);

        let path = save_json(dir.path(), &ParsedTable::default(), "empty").expect("empty export");
        assert_eq!(fs::read_to_string(path).expect("readable"), "[[]]");
    }
}
