//! # Table reconciliation
//!
//! Merges daily record batches into a product's historical table. The merge is
//! idempotent: a report date already present in the table is never admitted
//! again, so re-running over the same batch files leaves the table unchanged.
//!
//! [`reconcile`] is pure and works on an in-memory [`ProductTable`]; the
//! [`store`] submodule moves tables between a [`crate::spreadsheet::TableStore`]
//! and that representation.
pub mod store;

use crate::product::Product;
use crate::record::RecordBatch;
use crate::record::DATE_COLUMN;
use crate::record::DEFAULT_COMPARISON_LABEL;
use crate::record::MONTH_COLUMN;
use crate::spreadsheet::CellValue;
use crate::spreadsheet::TableRange;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use store::load_product_table;
pub use store::update_product_table;
pub use store::write_product_table;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Table '{0}' has no 'Date' column")]
    MissingDateColumn(String),

    #[error("Invalid column policy '{0}'")]
    PolicyError(String),
}

/// How a batch's columns are matched against a table's columns.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// Same field count only; fields map onto the table's columns by position
    #[default]
    Positional,
    /// Same field count and the same names position by position. Names are compared
    /// ignoring case and whitespace; any two comparison columns (`vs ...`) match.
    Named,
}

impl ColumnPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnPolicy::Named => "named",
            ColumnPolicy::Positional => "positional",
        }
    }

    pub fn parse(name: &str) -> Result<Self, ReconcileError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "named" | "name" => Ok(Self::Named),
            "positional" | "position" => Ok(Self::Positional),
            _ => Err(ReconcileError::PolicyError(name.to_string())),
        }
    }

    /// Checks that a batch can be appended under `table_columns`.
    /// Returns the reason when it cannot.
    pub fn check(&self, table_columns: &[String], batch_columns: &[String]) -> Result<(), String> {
        if table_columns.len() != batch_columns.len() {
            return Err(format!(
                "batch has {} fields, table has {}",
                batch_columns.len(),
                table_columns.len()
            ));
        }
        if *self == ColumnPolicy::Named {
            let mismatch = table_columns
                .iter()
                .zip(batch_columns)
                .find(|(table, batch)| !column_names_match(table, batch));
            if let Some((table, batch)) = mismatch {
                return Err(format!("batch column '{batch}' does not match table column '{table}'"));
            }
        }
        Ok(())
    }
}

fn normalize_column(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn column_names_match(table: &str, batch: &str) -> bool {
    let (table, batch) = (normalize_column(table), normalize_column(batch));
    table == batch || (table.starts_with(DEFAULT_COMPARISON_LABEL) && batch.starts_with(DEFAULT_COMPARISON_LABEL))
}

/// A product's historical table as read from the summary workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductTable {
    pub product: Product,
    /// Header row
    pub columns: Vec<String>,
    /// Data rows below the header, each as wide as `columns`
    pub rows: Vec<Vec<CellValue>>,
    /// Cells occupied by header and rows, 1-based
    pub range: TableRange,
}

impl ProductTable {
    /// Index of a column by name, ignoring case and surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.trim().eq_ignore_ascii_case(name))
    }

    /// Report dates present in the table.
    pub fn dates(&self) -> Result<BTreeSet<NaiveDate>, ReconcileError> {
        let date_col = self.date_column()?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(date_col).and_then(CellValue::to_date))
            .collect())
    }

    fn date_column(&self) -> Result<usize, ReconcileError> {
        self.column_index(DATE_COLUMN)
            .ok_or_else(|| ReconcileError::MissingDateColumn(self.product.to_string()))
    }
}

/// Outcome of merging batches into one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    /// The table after the merge
    pub table: ProductTable,
    /// Dates whose batch was appended
    pub admitted: Vec<NaiveDate>,
    /// Dates whose batch did not fit the table's columns
    pub rejected: Vec<NaiveDate>,
    /// Dates already present in the table (or admitted earlier in the same call)
    pub duplicates: Vec<NaiveDate>,
    /// Rows taken from admitted batches
    pub added_rows: usize,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl Reconciliation {
    /// Whether the table needs to be written back.
    pub fn changed(&self) -> bool {
        !self.admitted.is_empty()
    }
}

/// Merges batches into a table.
///
/// Only batches whose date is absent from the table are admitted, each date at most
/// once. Admitted rows are appended, rows without a month or without any value are
/// dropped, and rows are stable-sorted by date with unreadable dates last. When no
/// batch is admitted the table is returned as it was.
///
/// # Errors
/// `MissingDateColumn` when the table has no `Date` header.
pub fn reconcile(existing: &ProductTable, batches: &[RecordBatch], policy: ColumnPolicy) -> Result<Reconciliation, ReconcileError> {
    let date_col = existing.date_column()?;
    let month_col = existing.column_index(MONTH_COLUMN).unwrap_or(0);
    let product = existing.product;
    let mut known = existing.dates()?;

    let mut table = existing.clone();
    let mut admitted = Vec::new();
    let mut rejected = Vec::new();
    let mut duplicates = Vec::new();
    let mut added_rows = 0;

    for batch in batches {
        if known.contains(&batch.date) {
            debug!(%product, date = %batch.date, "date already present");
            duplicates.push(batch.date);
            continue;
        }
        if batch.is_empty() {
            debug!(%product, date = %batch.date, "batch has no rows");
            continue;
        }
        if let Err(reason) = policy.check(&existing.columns, &batch.columns) {
            warn!(%product, date = %batch.date, %reason, "rejecting batch");
            rejected.push(batch.date);
            continue;
        }
        if policy == ColumnPolicy::Positional {
            if let Err(reason) = ColumnPolicy::Named.check(&existing.columns, &batch.columns) {
                info!(%product, date = %batch.date, %reason, "column names differ; aligning by position");
            }
        }
        for row in &batch.rows {
            let mut row = row.clone();
            row.resize(existing.columns.len(), CellValue::Empty);
            row[date_col] = CellValue::Date(row[date_col].to_date().unwrap_or(batch.date));
            table.rows.push(row);
            added_rows += 1;
        }
        known.insert(batch.date);
        admitted.push(batch.date);
    }

    if !admitted.is_empty() {
        table.rows.retain(|row| {
            !row.iter().all(CellValue::is_empty) && !row.get(month_col).map_or(true, CellValue::is_empty)
        });
        table.rows.sort_by_key(|row| {
            let date = row.get(date_col).and_then(CellValue::to_date);
            (date.is_none(), date)
        });
        // A table keeps at least one (blank) data row
        table.range = existing.range.with_data_rows(table.rows.len().max(1));
    }

    Ok(Reconciliation {
        rows_before: existing.rows.len(),
        rows_after: table.rows.len(),
        table,
        admitted,
        rejected,
        duplicates,
        added_rows,
    })
}
