//! # Spreadsheet Module
//!
//! Reads and rewrites Office Open XML workbooks (`.xlsx`) directly from the ZIP
//! package: workbook structure, shared strings, number formats (to recognise
//! date cells), worksheet cells and the table parts attached to each sheet.
//!
//! Edits are kept in memory and written back in a single [`TableStore::save`],
//! which rewrites only the worksheet and table parts that changed and copies
//! every other part of the package unchanged.
pub mod cell;
pub(crate) mod excel;
pub mod range;
pub(crate) mod reference;
pub mod sheet;
pub mod store;
pub mod writer;
pub mod xlsx;

pub use cell::CellValue;
pub use range::TableRange;
pub use sheet::Sheet;
pub use store::{TableLocation, TableStore};
pub use writer::WorkbookWriter;
pub use xlsx::XlsxWorkbook;

use thiserror::Error;

/// Errors raised while reading or editing a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing part '{0}' in workbook")]
    FileError(String),

    #[error("Workbook '{0}' has no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Sheet '{0}' has no tables")]
    NoTables(String),

    #[error("Table '{table}' not found in sheet '{sheet}'")]
    TableNotFound { sheet: String, table: String },

    #[error("Cell coordinates must be 1-based, got row {row} column {col}")]
    InvalidCoordinate { row: usize, col: usize },

    #[error("Duplicate sheet name '{0}'")]
    DuplicateSheet(String),

    #[error("Cell at row {row} column {col} is beyond the sheet limits")]
    OutOfBounds { row: usize, col: usize },
}
