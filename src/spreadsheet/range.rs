use crate::error::LedgerError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_col;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?([A-Z]+)\$?(\d+)(:\$?([A-Z]+)\$?(\d+))?$").expect("Hardcode regex pattern")
});

/// Rectangular cell extent occupied by a table, 1-based and inclusive on all sides
/// (the numbers an A1 reference such as `A1:F12` spells out).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableRange {
    pub min_col: usize,
    pub min_row: usize,
    pub max_col: usize,
    pub max_row: usize,
}

impl TableRange {
    pub fn new(min_col: usize, min_row: usize, max_col: usize, max_row: usize) -> Self {
        TableRange { min_col, min_row, max_col, max_row }
    }

    /// Same anchor and width, resized to one header row plus `data_rows` rows.
    pub fn with_data_rows(&self, data_rows: usize) -> Self {
        TableRange {
            max_row: self.min_row + data_rows,
            ..*self
        }
    }
}

impl TryFrom<&str> for TableRange {
    type Error = LedgerError;

    /// Parses an Excel-style range ("A1:F12"); a single cell ("B2") yields a 1x1 range.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let captures = RANGE_PATTERN
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let bound = |col: usize, row: usize| -> Option<(usize, usize)> {
            let col = col_to_index(captures.get(col)?.as_str())? + 1;
            let row = row_to_index(captures.get(row)?.as_str())? + 1;
            Some((col, row))
        };
        let (min_col, min_row) = bound(1, 2).ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let (max_col, max_row) = bound(4, 5).unwrap_or((min_col, min_row));
        Ok(TableRange {
            min_col: min_col.min(max_col),
            min_row: min_row.min(max_row),
            max_col: min_col.max(max_col),
            max_row: min_row.max(max_row),
        })
    }
}

impl Display for TableRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            index_to_col(self.min_col - 1),
            self.min_row,
            index_to_col(self.max_col - 1),
            self.max_row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_range() {
        let range = TableRange::try_from("A1:F12").unwrap();
        assert_eq!(range, TableRange::new(1, 1, 6, 12));
        assert_eq!(range.to_string(), "A1:F12");
    }

    #[test]
    fn parse_absolute_and_single_cell() {
        assert_eq!(TableRange::try_from("$b$3:$g$9").unwrap(), TableRange::new(2, 3, 7, 9));
        assert_eq!(TableRange::try_from("C4").unwrap(), TableRange::new(3, 4, 3, 4));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TableRange::try_from("A:F").is_err());
        assert!(TableRange::try_from("not a range").is_err());
    }

    #[test]
    fn resize_keeps_anchor() {
        let range = TableRange::new(2, 3, 7, 40);
        assert_eq!(range.with_data_rows(5), TableRange::new(2, 3, 7, 8));
        assert_eq!(range.with_data_rows(0).to_string(), "B3:G3");
    }
}
