//! Writes new xlsx workbooks from rows of values, optionally wrapping each sheet's
//! rows in a named table.

use crate::error::LedgerError;
use crate::spreadsheet::cell::date_to_serial;
use crate::spreadsheet::cell::datetime_to_serial;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::SpreadsheetError;
use rust_xlsxwriter::ColNum;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::RowNum;
use rust_xlsxwriter::Table;
use rust_xlsxwriter::TableColumn;
use rust_xlsxwriter::TableStyle;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::Worksheet;
use std::path::Path;

/// Built-in number format used for date cells (`m/d/yyyy`, shown in the reader's locale)
const DATE_FORMAT_INDEX: u8 = 14;

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

struct PendingSheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    table: Option<String>,
}

/// Builder for a new workbook
#[derive(Default)]
pub struct WorkbookWriter {
    sheets: Vec<PendingSheet>,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet holding `rows` from cell A1.
    pub fn add_sheet(&mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Result<&mut Self, SpreadsheetError> {
        self.push(name, rows, None)
    }

    /// Adds a sheet whose rows form a table named `table`. The first row is the header;
    /// a table without data rows still spans one empty row, as Excel requires.
    pub fn add_table_sheet(&mut self, name: &str, table: &str, rows: Vec<Vec<CellValue>>) -> Result<&mut Self, SpreadsheetError> {
        self.push(name, rows, Some(table.to_owned()))
    }

    fn push(&mut self, name: &str, rows: Vec<Vec<CellValue>>, table: Option<String>) -> Result<&mut Self, SpreadsheetError> {
        let name: String = name.chars().take(MAX_SHEET_NAME).collect();
        if self.sheets.iter().any(|sheet| sheet.name.eq_ignore_ascii_case(&name)) {
            return Err(SpreadsheetError::DuplicateSheet(name));
        }
        self.sheets.push(PendingSheet { name, rows, table });
        Ok(self)
    }

    /// Writes the workbook to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let mut workbook = self.build()?;
        workbook.save(path.as_ref())?;
        Ok(())
    }

    fn build(&self) -> Result<Workbook, LedgerError> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format_index(DATE_FORMAT_INDEX);
        for pending in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&pending.name)?;
            // Table headers are written by the table itself
            let skip = usize::from(pending.table.is_some());
            for (row, values) in pending.rows.iter().enumerate().skip(skip) {
                for (col, value) in values.iter().enumerate() {
                    write_value(worksheet, row, col, value, &date_format)?;
                }
            }
            if let Some(table) = &pending.table {
                add_table(worksheet, table, &pending.rows)?;
            }
        }
        Ok(workbook)
    }
}

fn position(row: usize, col: usize) -> Result<(RowNum, ColNum), SpreadsheetError> {
    let out_of_bounds = || SpreadsheetError::OutOfBounds { row: row + 1, col: col + 1 };
    let row = RowNum::try_from(row).map_err(|_| out_of_bounds())?;
    let col = ColNum::try_from(col).map_err(|_| out_of_bounds())?;
    Ok((row, col))
}

fn write_value(
    worksheet: &mut Worksheet,
    row: usize,
    col: usize,
    value: &CellValue,
    date_format: &Format,
) -> Result<(), LedgerError> {
    let (row, col) = position(row, col)?;
    match value {
        CellValue::Empty => (),
        CellValue::Text(text) | CellValue::Error(text) => {
            worksheet.write_string(row, col, text)?;
        }
        CellValue::Number(number) => {
            worksheet.write_number(row, col, *number)?;
        }
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::Date(date) => {
            worksheet.write_number_with_format(row, col, date_to_serial(*date, false), date_format)?;
        }
        CellValue::DateTime(datetime) => {
            worksheet.write_number_with_format(row, col, datetime_to_serial(*datetime, false), date_format)?;
        }
    }
    Ok(())
}

/// Wraps the rows in a table; headers come from the first row, blanks named `ColumnN`.
fn add_table(worksheet: &mut Worksheet, name: &str, rows: &[Vec<CellValue>]) -> Result<(), LedgerError> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let header = rows.first();
    let columns: Vec<TableColumn> = (0..width)
        .map(|col| {
            let title = match header.and_then(|values| values.get(col)) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => format!("Column{}", col + 1),
            };
            TableColumn::new().set_header(title)
        })
        .collect();
    let table = Table::new()
        .set_name(name)
        .set_columns(&columns)
        .set_style(TableStyle::Medium2);
    let (last_row, last_col) = position(rows.len().max(2) - 1, width - 1)?;
    worksheet.add_table(0, 0, last_row, last_col, &table)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::store::TableStore;
    use crate::spreadsheet::xlsx::XlsxWorkbook;
    use chrono::NaiveDate;

    fn header() -> Vec<CellValue> {
        ["Month", "vs W", "Chg1", "Flat", "Chg2", "Date"].into_iter().map(CellValue::from).collect()
    }

    #[test]
    fn written_workbook_reads_back() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("book.xlsx");
        let date = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
        let mut writer = WorkbookWriter::new();
        writer.add_table_sheet("SRW_US_Gulf", "SRW_US_Gulf", vec![
            header(),
            vec!["Dec".into(), 75.0.into(), (-2.0).into(), 245.5.into(), CellValue::Empty, date.into()],
        ])?;
        writer.add_sheet("Notes", vec![vec!["a & b".into()]])?;
        writer.save(&path)?;

        let workbook = XlsxWorkbook::open(&path)?;
        assert_eq!(workbook.sheet_names(), vec!["SRW_US_Gulf", "Notes"]);
        let location = workbook.locate_table("SRW_US_Gulf", "SRW_US_Gulf")?;
        assert_eq!(location.range.to_string(), "A1:F2");
        assert_eq!(workbook.cell("SRW_US_Gulf", 1, 2)?, CellValue::from("vs W"));
        assert_eq!(workbook.cell("SRW_US_Gulf", 2, 6)?, CellValue::Date(date));
        assert_eq!(workbook.cell("SRW_US_Gulf", 2, 4)?, CellValue::Number(245.5));
        assert_eq!(workbook.cell("SRW_US_Gulf", 2, 5)?, CellValue::Empty);
        assert_eq!(workbook.cell("Notes", 1, 1)?, CellValue::from("a & b"));
        assert!(workbook.date_style.is_some());
        Ok(())
    }

    #[test]
    fn header_only_table_spans_an_empty_row() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("summary.xlsx");
        WorkbookWriter::new()
            .add_table_sheet("Gulf_Corn", "Gulf_Corn", vec![header()])?
            .save(&path)?;

        let workbook = XlsxWorkbook::open(&path)?;
        let location = workbook.locate_table("Gulf_Corn", "Gulf_Corn")?;
        assert_eq!(location.range.to_string(), "A1:F2");
        let rows = workbook.read_range("Gulf_Corn", &location.range)?;
        assert_eq!(rows[0], header());
        assert_eq!(rows[1], vec![CellValue::Empty; 6]);
        Ok(())
    }

    #[test]
    fn duplicate_sheet_names_are_rejected() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Data", Vec::new()).unwrap();
        assert!(matches!(writer.add_sheet("data", Vec::new()), Err(SpreadsheetError::DuplicateSheet(_))));
    }
}
