//! Spreadsheet artifact writer.
//!
//! Table row `i`, column `j` lands in cell `<column j><i + 1>`, so the header
//! occupies row 1 and `table[2][1]` lands in `B3`. Every field is written as
//! a string cell.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{ColNum, RowNum, Workbook};
use tracing::{debug, instrument};

use super::{ExportError, ExportFormat, prepare_artifact};
use crate::table::ParsedTable;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Rows available in a worksheet.
const MAX_ROWS: usize = 1_048_576;
/// Columns available in a worksheet.
const MAX_COLUMNS: usize = 16_384;

/// Returns the spreadsheet letters for zero-based `column`.
///
/// Letters continue past `Z` as `AA`, `AB`, and so on.
///
/// # Examples
/// ```
/// use knapsweep_core::export::column_name;
///
/// assert_eq!(column_name(0), "A");
/// assert_eq!(column_name(25), "Z");
/// assert_eq!(column_name(26), "AA");
/// ```
#[must_use]
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "Bijective base-26 conversion is defined in terms of quotient and remainder."
)]
pub fn column_name(column: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = column.saturating_add(1);
    while remaining > 0 {
        let digit = (remaining - 1) % ALPHABET.len();
        if let Some(letter) = ALPHABET.get(digit) {
            letters.push(char::from(*letter));
        }
        remaining = (remaining - 1) / ALPHABET.len();
    }
    letters.iter().rev().collect()
}

/// Returns the A1-style reference of zero-based table position
/// (`row`, `column`).
///
/// # Examples
/// ```
/// use knapsweep_core::export::cell_reference;
///
/// assert_eq!(cell_reference(0, 0), "A1");
/// assert_eq!(cell_reference(2, 1), "B3");
/// ```
#[must_use]
pub fn cell_reference(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row.saturating_add(1))
}

fn cell_position(row: usize, column: usize) -> Result<(RowNum, ColNum), ExportError> {
    let out_of_range = || ExportError::CellOutOfRange { row, column };
    if row >= MAX_ROWS || column >= MAX_COLUMNS {
        return Err(out_of_range());
    }
    let row_num = RowNum::try_from(row).map_err(|_| out_of_range())?;
    let col_num = ColNum::try_from(column).map_err(|_| out_of_range())?;
    Ok((row_num, col_num))
}

/// Writes `table` to `<root>/xlsx/<name>.xlsx` as a single-sheet workbook.
///
/// # Errors
/// Returns [`ExportError`] when the directory cannot be created, the table
/// exceeds the worksheet limits, or the workbook cannot be saved.
#[instrument(name = "export.xlsx", err, skip(table), fields(rows = table.len()))]
pub fn save_xlsx(root: &Path, table: &ParsedTable, name: &str) -> Result<PathBuf, ExportError> {
    let path = prepare_artifact(root, ExportFormat::Xlsx, name)?;
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        for (row_index, row) in table.iter_rows().enumerate() {
            for (column_index, value) in row.iter().enumerate() {
                let (row_num, col_num) = cell_position(row_index, column_index)?;
                worksheet
                    .write_string(row_num, col_num, value.as_str())
                    .map_err(|source| ExportError::Workbook {
                        cell: cell_reference(row_index, column_index),
                        source,
                    })?;
            }
        }
    }
    workbook.save(&path).map_err(|source| ExportError::Save {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "xlsx artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use calamine::{Data, Reader, Xlsx, open_workbook};
    use knapsweep_test_support::solver_output::solver_output;
    use rstest::rstest;
    use tempfile::TempDir;

    use crate::table::parse_table;

    #[rstest]
    #[case(0, "A")]
    #[case(1, "B")]
    #[case(25, "Z")]
    #[case(26, "AA")]
    #[case(27, "AB")]
    #[case(51, "AZ")]
    #[case(52, "BA")]
    #[case(701, "ZZ")]
    #[case(702, "AAA")]
    #[case(16_383, "XFD")]
    fn column_names_use_bijective_letters(#[case] column: usize, #[case] expected: &str) {
        assert_eq!(column_name(column), expected);
    }

    #[rstest]
    #[case(0, 0, "A1")]
    #[case(2, 1, "B3")]
    #[case(9, 27, "AB10")]
    fn cell_reference_is_one_based(#[case] row: usize, #[case] column: usize, #[case] expected: &str) {
        assert_eq!(cell_reference(row, column), expected);
    }

    #[rstest]
    #[case::row(MAX_ROWS, 0)]
    #[case::column(0, MAX_COLUMNS)]
    fn positions_beyond_sheet_limits_are_rejected(#[case] row: usize, #[case] column: usize) {
        assert!(matches!(
            cell_position(row, column),
            Err(ExportError::CellOutOfRange { .. })
        ));
    }

    fn read_cell(range: &calamine::Range<Data>, row: u32, column: u32) -> Option<String> {
        range.get_value((row, column)).map(ToString::to_string)
    }

    #[rstest]
    fn cells_follow_table_positions() {
        let dir = TempDir::new().expect("temp dir");
        let table = parse_table(&solver_output(3, 2, 50));
        let path = save_xlsx(dir.path(), &table, "result-1-2").expect("export must succeed");
        assert_eq!(path, dir.path().join("xlsx").join("result-1-2.xlsx"));

        let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook must open");
        assert_eq!(workbook.sheet_names().len(), 1);
        let range = workbook
            .worksheet_range("Sheet1")
            .expect("default sheet must exist");

        assert_eq!(read_cell(&range, 0, 0).as_deref(), Some("ITER"));
        assert_eq!(read_cell(&range, 0, 1).as_deref(), Some("RELW,%"));
        for (i, row) in table.iter_rows().enumerate() {
            for (j, value) in row.iter().enumerate() {
                let (r, c) = (u32::try_from(i).expect("row"), u32::try_from(j).expect("col"));
                assert_eq!(read_cell(&range, r, c).as_deref(), Some(value.as_str()));
            }
        }
        assert_eq!(read_cell(&range, 2, 1).as_deref(), Some("50"));
    }

    #[rstest]
    fn wide_tables_are_not_truncated() {
        let dir = TempDir::new().expect("temp dir");
        let table = parse_table(&solver_output(1, 30, 10));
        assert_eq!(table.width(), 32);
        let path = save_xlsx(dir.path(), &table, "wide").expect("export must succeed");

        let mut workbook: Xlsx<_> = open_workbook(&path).expect("workbook must open");
        let range = workbook.worksheet_range("Sheet1").expect("sheet");
        // Column AF is the 32nd column.
        assert_eq!(cell_reference(1, 31), "AF2");
        assert_eq!(read_cell(&range, 1, 31).as_deref(), Some("187"));
    }

    #[rstest]
    fn degenerate_table_still_produces_a_workbook() {
        let dir = TempDir::new().expect("temp dir");
        let path = save_xlsx(dir.path(), &ParsedTable::default(), "empty")
            .expect("empty table must export");
        assert!(path.is_file());
    }
}
