//! Table-level access to a persisted workbook.
//!
//! The reconciler only ever talks to a [`TableStore`]: locate a named table,
//! read and write cells by 1-based coordinate, reassign the table's range, and
//! persist everything once at the end of a run.
use crate::error::LedgerError;
use crate::error::ResultOptionChain;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::range::TableRange;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::spreadsheet::SpreadsheetError;

/// A table found in the store: the sheet holding it, its own name and its current range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableLocation {
    pub sheet: String,
    pub table: String,
    pub range: TableRange,
}

pub trait TableStore {
    /// Locates the table `table` in sheet `sheet`, falling back to the sheet's first table.
    fn locate_table(&self, sheet: &str, table: &str) -> Result<TableLocation, SpreadsheetError>;

    /// Reads a cell by 1-based (row, col); blank cells read as `CellValue::Empty`.
    fn cell(&self, sheet: &str, row: usize, col: usize) -> Result<CellValue, SpreadsheetError>;

    /// Writes a cell by 1-based (row, col).
    fn set_cell(&mut self, sheet: &str, row: usize, col: usize, value: CellValue) -> Result<(), SpreadsheetError>;

    /// Empties a cell by 1-based (row, col).
    fn clear_cell(&mut self, sheet: &str, row: usize, col: usize) -> Result<(), SpreadsheetError>;

    /// Reassigns the occupied range of a table.
    fn set_table_range(&mut self, sheet: &str, table: &str, range: TableRange) -> Result<(), SpreadsheetError>;

    /// Persists every edit made since loading.
    fn save(&mut self) -> Result<(), LedgerError>;

    /// Reads every cell of a range, row by row.
    fn read_range(&self, sheet: &str, range: &TableRange) -> Result<Vec<Vec<CellValue>>, SpreadsheetError> {
        (range.min_row..=range.max_row)
            .map(|row| {
                (range.min_col..=range.max_col)
                    .map(|col| self.cell(sheet, row, col))
                    .collect()
            })
            .collect()
    }

    /// Empties every cell of a range.
    fn clear_range(&mut self, sheet: &str, range: &TableRange) -> Result<(), SpreadsheetError> {
        for row in range.min_row..=range.max_row {
            for col in range.min_col..=range.max_col {
                self.clear_cell(sheet, row, col)?;
            }
        }
        Ok(())
    }
}

/// Converts a 1-based coordinate to the 0-based one used by `Sheet`
fn to_index(row: usize, col: usize) -> Result<(usize, usize), SpreadsheetError> {
    if row == 0 || col == 0 {
        Err(SpreadsheetError::InvalidCoordinate { row, col })
    } else {
        Ok((row - 1, col - 1))
    }
}

impl TableStore for XlsxWorkbook {
    fn locate_table(&self, sheet: &str, table: &str) -> Result<TableLocation, SpreadsheetError> {
        let part = self
            .worksheet(sheet)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_owned()))?;
        let found = Ok::<_, SpreadsheetError>(self.table(sheet, table))
            .ok_none_else(|| Ok(part.tables.first()))?;
        match found {
            Some(found) => Ok(TableLocation {
                sheet: part.sheet.name().to_owned(),
                table: found.name.to_owned(),
                range: found.range,
            }),
            None => Err(SpreadsheetError::NoTables(sheet.to_owned())),
        }
    }

    fn cell(&self, sheet: &str, row: usize, col: usize) -> Result<CellValue, SpreadsheetError> {
        let (row, col) = to_index(row, col)?;
        let part = self
            .worksheet(sheet)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_owned()))?;
        Ok(part.sheet.get(row, col).cloned().unwrap_or_default())
    }

    fn set_cell(&mut self, sheet: &str, row: usize, col: usize, value: CellValue) -> Result<(), SpreadsheetError> {
        let (row, col) = to_index(row, col)?;
        let fallback_style = match value {
            CellValue::Date(_) | CellValue::DateTime(_) => self.date_style,
            _ => None,
        };
        self.worksheet_mut(sheet)?.sheet.set(row, col, value, fallback_style);
        Ok(())
    }

    fn clear_cell(&mut self, sheet: &str, row: usize, col: usize) -> Result<(), SpreadsheetError> {
        let (row, col) = to_index(row, col)?;
        self.worksheet_mut(sheet)?.sheet.clear(row, col);
        Ok(())
    }

    fn set_table_range(&mut self, sheet: &str, table: &str, range: TableRange) -> Result<(), SpreadsheetError> {
        let part = self.table_mut(sheet, table)?;
        if part.range != range {
            part.range = range;
            part.dirty = true;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), LedgerError> {
        self.save_package()
    }
}
