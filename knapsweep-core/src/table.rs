//! Parser for the solver's `|`-delimited result table.
//!
//! The solver prints a free-form preamble followed by a table whose header
//! line contains [`HEADER_MARKER`]. Every table line ends with a trailing
//! [`FIELD_DELIMITER`], and each data row is labelled with
//! [`ROW_LABEL_PREFIX`] followed by the iteration number:
//!
//! ```text
//! ITER   |RELW, %|Time,ms|
//! -------x-------x-------x
//! I:    0|     50|    123|
//! ```

use serde::ser::{Serialize, Serializer};

/// Token identifying the header line.
pub const HEADER_MARKER: &str = "ITER";

/// Separator between table fields.
pub const FIELD_DELIMITER: char = '|';

/// Label stripped from the first field of every data row.
pub const ROW_LABEL_PREFIX: &str = "I:";

/// A parsed solver table: one header row followed by data rows.
///
/// Data rows normally carry as many fields as the header, but the parser
/// keeps whatever the solver printed; [`ParsedTable::ragged_rows`] reports
/// rows whose width differs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Builds a table from already split rows.
    #[must_use]
    pub const fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Header field names.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, excluding the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows including the header.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len() + 1
    }

    /// Returns `true` when the table holds no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` when a header line with fields was found.
    #[must_use]
    pub const fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// Width of the widest row, header included.
    #[must_use]
    pub fn width(&self) -> usize {
        self.iter_rows().map(<[String]>::len).max().unwrap_or(0)
    }

    /// Indices (into [`ParsedTable::rows`]) of data rows whose field count
    /// differs from the header.
    #[must_use]
    pub fn ragged_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.len() != self.header.len())
            .map(|(index, _)| index)
            .collect()
    }

    /// Iterates over all rows, header first.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.header.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }

    /// Copies all rows, header first.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.iter_rows().map(<[String]>::to_vec).collect()
    }
}

impl Serialize for ParsedTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter_rows())
    }
}

/// Parses solver output into a [`ParsedTable`].
///
/// Lines before the first line containing [`HEADER_MARKER`] are ignored.
/// Each remaining line is split on [`FIELD_DELIMITER`], the segment after the
/// final delimiter is dropped, and whitespace is removed from every field.
/// Lines that yield no fields (blank lines, separator rules) are skipped.
/// When the marker never appears the result has an empty header and no rows.
///
/// # Examples
/// ```
/// use knapsweep_core::parse_table;
///
/// let table = parse_table("X | ITER | VAL |\nI:0 | 1 | 10 |\nI:1 | 2 | 20 |\n");
/// assert_eq!(table.header(), ["X", "ITER", "VAL"]);
/// assert_eq!(table.rows()[1], ["1", "2", "20"]);
/// ```
#[must_use]
pub fn parse_table(text: &str) -> ParsedTable {
    let mut lines = text.lines().skip_while(|line| !line.contains(HEADER_MARKER));
    let Some(header_line) = lines.next() else {
        return ParsedTable::default();
    };

    let header = split_fields(header_line);
    let rows = lines
        .map(split_fields)
        .filter(|fields| !fields.is_empty())
        .map(strip_row_label)
        .collect();
    ParsedTable::new(header, rows)
}

fn split_fields(line: &str) -> Vec<String> {
    let mut segments: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    segments.pop();
    segments.into_iter().map(remove_whitespace).collect()
}

fn remove_whitespace(field: &str) -> String {
    field.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_row_label(mut fields: Vec<String>) -> Vec<String> {
    if let Some(first) = fields.first_mut()
        && let Some(rest) = first.strip_prefix(ROW_LABEL_PREFIX)
    {
        *first = rest.to_owned();
    }
    fields
}
