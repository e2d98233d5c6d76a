//! Daily batch workbooks.
//!
//! Every segmented report is kept as `FOB_YYYYMMDD.xlsx`: one sheet per product
//! with the header `Month, <label>, Chg1, Flat, Chg2, Date` and one row per
//! contract month. The summary pass rebuilds its batches from these files, so a
//! table can be reconciled again at any time without the original reports.
use crate::error::LedgerError;
use crate::error::ResultMessage;
use crate::product::Product;
use crate::record::ProductBatch;
use crate::record::RecordBatch;
use crate::spreadsheet::CellValue;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::WorkbookWriter;
use crate::spreadsheet::XlsxWorkbook;
use chrono::NaiveDate;
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch file '{0}' already exists")]
    AlreadyExists(String),

    #[error("No records to write for {0}")]
    NothingToWrite(NaiveDate),
}

/// File name glob of daily batch workbooks
pub const BATCH_FILE_GLOB: &str = "FOB_*.xlsx";

static BATCH_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"FOB_(\d{8})").expect("Hardcode regex pattern")
});

/// `FOB_YYYYMMDD.xlsx`
pub fn batch_file_name(date: NaiveDate) -> String {
    format!("FOB_{}.xlsx", date.format("%Y%m%d"))
}

/// Report date encoded in a batch file name.
pub fn batch_date(file_name: &str) -> Option<NaiveDate> {
    let captures = BATCH_DATE_PATTERN.captures(file_name)?;
    NaiveDate::parse_from_str(&captures[1], "%Y%m%d").ok()
}

/// Writes the records of one report to `dir`, one sheet per product in catalogue order.
///
/// # Errors
/// `AlreadyExists` if the day's file is already present; batch files are never overwritten.
pub fn write_daily_workbook(dir: &Path, date: NaiveDate, batches: &BTreeMap<Product, ProductBatch>) -> Result<PathBuf, LedgerError> {
    let path = dir.join(batch_file_name(date));
    if path.exists() {
        Err(BatchError::AlreadyExists(path.display().to_string()))?
    }
    if batches.is_empty() {
        Err(BatchError::NothingToWrite(date))?
    }

    let mut writer = WorkbookWriter::new();
    for (product, records) in batches {
        let rows = RecordBatch::from_records(date, records).to_rows();
        writer.add_sheet(product.as_str(), rows)?;
    }
    writer.save(&path).with_prefix(&path.display().to_string())?;
    debug!(path = %path.display(), products = batches.len(), "wrote batch file");
    Ok(path)
}

/// Finds the batch files in `dir`, keyed by report date.
/// Files whose name carries no valid date are skipped.
pub fn discover_batches(dir: &Path) -> Result<BTreeMap<NaiveDate, PathBuf>, LedgerError> {
    let pattern = Pattern::new(BATCH_FILE_GLOB)?;
    let mut batches = BTreeMap::new();
    let entries = fs::read_dir(dir).map_err(LedgerError::from).with_prefix(&dir.display().to_string())?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !pattern.matches(name) {
            continue;
        }
        match batch_date(name) {
            Some(date) => {
                batches.insert(date, path);
            }
            None => warn!(file = name, "batch file name carries no valid date"),
        }
    }
    Ok(batches)
}

/// Reads one product's sheet of a batch workbook. A workbook without that sheet,
/// or with an empty one, yields `None`.
pub fn read_product_batch(workbook: &XlsxWorkbook, date: NaiveDate, product: Product) -> Option<RecordBatch> {
    let sheet = workbook.sheet(product.as_str())?;
    sheet_batch(sheet, date)
}

fn sheet_batch(sheet: &Sheet, date: NaiveDate) -> Option<RecordBatch> {
    let (_, _, last_row, last_col) = sheet.bounds()?;
    let mut rows = sheet.values(0, 0, last_row, last_col).into_iter();
    let columns = rows
        .next()?
        .iter()
        .map(|value| value.to_string().trim().to_owned())
        .collect();
    let rows: Vec<Vec<CellValue>> = rows.filter(|row| !row.iter().all(CellValue::is_empty)).collect();
    Some(RecordBatch::new(date, columns, rows))
}

/// Loads every batch file found in `dir`, grouped by product and ordered by date.
///
/// Unreadable files are logged and skipped so that one damaged file does not hold
/// back the others.
pub fn load_batches(dir: &Path) -> Result<BTreeMap<Product, Vec<RecordBatch>>, LedgerError> {
    let mut batches: BTreeMap<Product, Vec<RecordBatch>> = BTreeMap::new();
    for (date, path) in discover_batches(dir)? {
        let workbook = match XlsxWorkbook::open(&path) {
            Ok(workbook) => workbook,
            Err(error) => {
                warn!(%date, %error, "skipping unreadable batch file");
                continue;
            }
        };
        for product in Product::ALL {
            match read_product_batch(&workbook, date, product) {
                Some(batch) => batches.entry(product).or_default().push(batch),
                None => debug!(%date, %product, "no sheet in batch file"),
            }
        }
    }
    Ok(batches)
}
