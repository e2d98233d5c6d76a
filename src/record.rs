use crate::spreadsheet::CellValue;
use chrono::NaiveDate;

/// Header of the contract month column
pub const MONTH_COLUMN: &str = "Month";
/// Header of the observation date column
pub const DATE_COLUMN: &str = "Date";
/// Comparison label used when a block's sub-header is blank
pub const DEFAULT_COMPARISON_LABEL: &str = "vs";
/// Headers of the three figures following the basis column
pub const FIGURE_COLUMNS: [&str; 3] = ["Chg1", "Flat", "Chg2"];

/// One quoted contract month of one product on one report date.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductRecord {
    /// Contract month label, e.g. `Dec` or `Mar 26`
    pub month: String,
    /// Sub-header text of the block, e.g. `vs W`; header of the basis column
    pub comparison_label: String,
    /// Spread against the comparison contract
    pub basis: CellValue,
    pub chg1: CellValue,
    pub flat: CellValue,
    pub chg2: CellValue,
    /// Report date the record was observed on
    pub date: NaiveDate,
}

/// Records of one product taken from one document, in report row order.
pub type ProductBatch = Vec<ProductRecord>;

impl ProductRecord {
    /// Number of positional fields
    pub const FIELDS: usize = 6;

    /// Column headers in positional order.
    pub fn header(&self) -> Vec<String> {
        header_for(&self.comparison_label)
    }

    /// Cell values in positional order.
    pub fn to_row(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.month.to_owned()),
            self.basis.clone(),
            self.chg1.clone(),
            self.flat.clone(),
            self.chg2.clone(),
            CellValue::Date(self.date),
        ]
    }
}

/// Headers `Month, <label>, Chg1, Flat, Chg2, Date`
pub fn header_for(comparison_label: &str) -> Vec<String> {
    let label = match comparison_label.trim() {
        "" => DEFAULT_COMPARISON_LABEL,
        label => label,
    };
    std::iter::once(MONTH_COLUMN)
        .chain(std::iter::once(label))
        .chain(FIGURE_COLUMNS)
        .chain(std::iter::once(DATE_COLUMN))
        .map(str::to_owned)
        .collect()
}

/// Records of one product for one report date, as rows of cells under named columns.
///
/// Built either from freshly segmented [`ProductRecord`]s or from a sheet of a daily
/// batch workbook, so the shape is not guaranteed to match a summary table; the
/// reconciler checks it before admitting any row.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordBatch {
    pub date: NaiveDate,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RecordBatch {
    pub fn new(date: NaiveDate, columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        RecordBatch { date, columns, rows }
    }

    /// Builds a batch from records; the header comes from the first record.
    pub fn from_records(date: NaiveDate, records: &[ProductRecord]) -> Self {
        let columns = records
            .first()
            .map(ProductRecord::header)
            .unwrap_or_else(|| header_for(DEFAULT_COMPARISON_LABEL));
        let rows = records.iter().map(ProductRecord::to_row).collect();
        RecordBatch { date, columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row followed by the data rows, ready to be written to a sheet.
    pub fn to_rows(&self) -> Vec<Vec<CellValue>> {
        std::iter::once(self.columns.iter().map(|name| CellValue::from(name.as_str())).collect())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(month: &str, label: &str) -> ProductRecord {
        ProductRecord {
            month: month.to_owned(),
            comparison_label: label.to_owned(),
            basis: CellValue::Number(75.0),
            chg1: CellValue::Number(-2.0),
            flat: CellValue::Number(245.5),
            chg2: CellValue::Empty,
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        }
    }

    #[test]
    fn record_fields_are_positional() {
        let record = record("Dec", "vs W");
        assert_eq!(record.header(), vec!["Month", "vs W", "Chg1", "Flat", "Chg2", "Date"]);
        let row = record.to_row();
        assert_eq!(row.len(), ProductRecord::FIELDS);
        assert_eq!(row[0], CellValue::from("Dec"));
        assert_eq!(row[5], CellValue::Date(record.date));
    }

    #[test]
    fn blank_label_falls_back_to_vs() {
        assert_eq!(record("Dec", "  ").header()[1], "vs");
    }

    #[test]
    fn batch_from_records() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let batch = RecordBatch::from_records(date, &[record("Dec", "vs Z"), record("Mar", "vs Z")]);
        assert_eq!(batch.columns.len(), 6);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.to_rows()[0][1], CellValue::from("vs Z"));

        let empty = RecordBatch::from_records(date, &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.columns[1], "vs");
    }
}
