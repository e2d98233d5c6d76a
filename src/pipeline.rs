//! # Daily run
//!
//! A run has two passes:
//!
//! 1. **Documents**: every report in the data directory whose batch file does not
//!    exist yet is segmented and saved as `FOB_YYYYMMDD.xlsx` in the batch directory.
//! 2. **Summary**: every batch file is loaded and merged into the matching product
//!    table of the summary workbook, which is saved once at the end.
//!
//! Both passes skip what they have already done, so running them repeatedly is safe.
use crate::batch::batch_file_name;
use crate::batch::load_batches;
use crate::batch::write_daily_workbook;
use crate::extract::source_for;
use crate::extract::GridSource;
use crate::product::Product;
use crate::reconcile::update_product_table;
use crate::reconcile::ColumnPolicy;
use crate::record::header_for;
use crate::record::RecordBatch;
use crate::record::DEFAULT_COMPARISON_LABEL;
use crate::segment::SegmentOptions;
use crate::segment::Segmenter;
use crate::spreadsheet::CellValue;
use crate::spreadsheet::TableStore;
use crate::spreadsheet::WorkbookWriter;
use crate::spreadsheet::XlsxWorkbook;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;
use tracing::info;
use tracing::warn;

static DOCUMENT_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"RJODailyFOBComparative(\d{4}-\d{2}-\d{2})").expect("Hardcode regex pattern")
});

/// Locations and tuning of a run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the daily reports
    pub data_dir: PathBuf,
    /// Directory holding the daily batch workbooks
    pub batch_dir: PathBuf,
    /// Summary workbook with one table per product
    pub summary_path: PathBuf,
    /// File name glob selecting reports in `data_dir`
    pub document_glob: String,
    pub segment: SegmentOptions,
    pub column_policy: ColumnPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            batch_dir: PathBuf::from("csv"),
            summary_path: PathBuf::from("summary.xlsx"),
            document_glob: "RJODailyFOBComparative*.pdf".to_owned(),
            segment: SegmentOptions::default(),
            column_policy: ColumnPolicy::default(),
        }
    }
}

/// Creates the data and batch directories if missing.
pub fn ensure_directories(config: &Config) -> Result<()> {
    for dir in [&config.data_dir, &config.batch_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Report date embedded in a report file name such as
/// `RJODailyFOBComparative2025-10-15202510.pdf`.
pub fn document_date(file_name: &str) -> Option<NaiveDate> {
    let captures = DOCUMENT_DATE_PATTERN.captures(file_name)?;
    NaiveDate::parse_from_str(&captures[1], "%Y-%m-%d").ok()
}

/// Counts of the documents pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentPass {
    /// Reports turned into batch files
    pub written: usize,
    /// Reports whose batch file already existed
    pub existing: usize,
    /// Reports without a date in their name, without a page, or failing to parse
    pub skipped: usize,
}

/// Segments one report and saves its batch file.
///
/// # Returns
/// The batch file written, or `None` when the report yields no records.
pub fn process_document<G: GridSource + ?Sized>(source: &G, date: NaiveDate, config: &Config) -> Result<Option<PathBuf>> {
    let Some(grid) = source.first_page_grid()? else {
        warn!(%date, "report has no readable first page");
        return Ok(None);
    };
    let batches = Segmenter::with_options(config.segment.clone()).segment(&grid, date);
    if batches.is_empty() {
        warn!(%date, "no product tables found in report");
        return Ok(None);
    }
    let path = write_daily_workbook(&config.batch_dir, date, &batches)?;
    Ok(Some(path))
}

/// Report files of the data directory matching the document glob, by name.
fn list_documents(config: &Config) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(&config.document_glob)
        .with_context(|| format!("Invalid document pattern '{}'", config.document_glob))?;
    let entries = fs::read_dir(&config.data_dir)
        .with_context(|| format!("Failed to list {}", config.data_dir.display()))?;
    let mut documents = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matched = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name));
        if matched && path.is_file() {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Runs the documents pass.
pub fn process_daily_documents(config: &Config) -> Result<DocumentPass> {
    let mut pass = DocumentPass::default();
    for path in list_documents(config)? {
        let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        let Some(date) = document_date(name) else {
            warn!(file = name, "skipping report: no date in file name");
            pass.skipped += 1;
            continue;
        };
        if config.batch_dir.join(batch_file_name(date)).exists() {
            debug!(file = name, %date, "batch file already exists");
            pass.existing += 1;
            continue;
        }

        info!(file = name, %date, "processing report");
        match process_document(source_for(&path).as_ref(), date, config) {
            Ok(Some(output)) => {
                info!(file = %output.display(), "created batch file");
                pass.written += 1;
            }
            Ok(None) => pass.skipped += 1,
            Err(error) => {
                warn!(file = name, error = %format!("{error:#}"), "failed to process report");
                pass.skipped += 1;
            }
        }
    }
    info!(written = pass.written, existing = pass.existing, skipped = pass.skipped, "documents pass finished");
    Ok(pass)
}

/// Counts of the summary pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryPass {
    /// Tables that received at least one new date
    pub updated: usize,
    /// Tables already holding every available date
    pub unchanged: usize,
    /// Tables missing from the workbook or unusable
    pub skipped: usize,
    /// Data rows added over all tables
    pub rows_added: usize,
}

/// Merges the batches into every product table of a store. Failures are contained
/// to the product they occur in. Nothing is saved.
pub fn update_tables<S: TableStore>(store: &mut S, batches: &BTreeMap<Product, Vec<RecordBatch>>, policy: ColumnPolicy) -> SummaryPass {
    let mut pass = SummaryPass::default();
    for product in Product::ALL {
        let product_batches = batches.get(&product).map(Vec::as_slice).unwrap_or_default();
        match update_product_table(store, product, product_batches, policy) {
            Ok(reconciliation) if reconciliation.changed() => {
                pass.updated += 1;
                pass.rows_added += reconciliation.added_rows;
            }
            Ok(_) => pass.unchanged += 1,
            Err(error) => {
                warn!(%product, %error, "skipping table");
                pass.skipped += 1;
            }
        }
    }
    pass
}

/// Runs the summary pass. An unreadable summary workbook aborts the pass.
pub fn update_summary_workbook(config: &Config) -> Result<SummaryPass> {
    let mut workbook = XlsxWorkbook::open(&config.summary_path)
        .with_context(|| format!("Failed to load summary workbook {}", config.summary_path.display()))?;
    let batches = load_batches(&config.batch_dir)
        .with_context(|| format!("Failed to load batch files from {}", config.batch_dir.display()))?;
    debug!(products = batches.len(), "loaded batch files");

    let pass = update_tables(&mut workbook, &batches, config.column_policy);
    if pass.updated > 0 {
        workbook
            .save()
            .with_context(|| format!("Failed to save summary workbook {}", config.summary_path.display()))?;
    }
    info!(
        updated = pass.updated,
        unchanged = pass.unchanged,
        skipped = pass.skipped,
        rows_added = pass.rows_added,
        "summary pass finished"
    );
    Ok(pass)
}

/// Writes an empty summary workbook: one sheet per product holding a table named
/// like the product, with the record header and a single blank row.
pub fn init_summary(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("Summary workbook {} already exists", path.display());
    }
    let header: Vec<CellValue> = header_for(DEFAULT_COMPARISON_LABEL)
        .iter()
        .map(|name| CellValue::from(name.as_str()))
        .collect();
    let mut writer = WorkbookWriter::new();
    for product in Product::ALL {
        writer.add_table_sheet(product.as_str(), product.as_str(), vec![header.clone()])?;
    }
    writer
        .save(path)
        .with_context(|| format!("Failed to write summary workbook {}", path.display()))?;
    info!(path = %path.display(), tables = Product::ALL.len(), "created summary workbook");
    Ok(())
}

/// Runs both passes.
pub fn run(config: &Config) -> Result<()> {
    ensure_directories(config)?;
    process_daily_documents(config)?;
    update_summary_workbook(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pdf::write_grid_pdf;
    use crate::reconcile::load_product_table;
    use crate::segment::RawGrid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    /// A seven-section report where every product quotes the given months.
    fn report(months: &[&str], flat: f64) -> RawGrid {
        let mut grid = Vec::new();
        for section in 0..7 {
            let mut header = vec![None];
            let mut sub_header = vec![None];
            for block in 0..4 {
                header.extend([Some(format!("Product {section}.{block}")), None, None, None]);
                sub_header.extend([Some("vs H".to_owned()), Some("Chg".to_owned()), Some("Flat".to_owned()), Some("Chg".to_owned())]);
            }
            grid.push(header);
            grid.push(sub_header);
            for month in months {
                let mut row = vec![Some(month.to_string())];
                for _ in 0..4 {
                    row.extend([Some("12".to_owned()), Some("-1".to_owned()), Some(flat.to_string()), Some("+0.5".to_owned())]);
                }
                grid.push(row);
            }
        }
        grid.push(vec![Some("Prices are indicative".to_owned())]);
        grid
    }

    fn write_report(dir: &Path, name: &str, grid: &RawGrid) -> Result<()> {
        let rows = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().map(CellValue::from).unwrap_or_default())
                    .collect()
            })
            .collect();
        WorkbookWriter::new().add_sheet("Page 1", rows)?.save(dir.join(name))?;
        Ok(())
    }

    fn config(root: &Path) -> Config {
        Config {
            data_dir: root.join("data"),
            batch_dir: root.join("csv"),
            summary_path: root.join("summary.xlsx"),
            document_glob: "RJODailyFOBComparative*.xlsx".to_owned(),
            ..Config::default()
        }
    }

    #[test]
    fn document_dates() {
        assert_eq!(document_date("RJODailyFOBComparative2025-10-15202510.pdf"), Some(date(15)));
        assert_eq!(document_date("RJODailyFOBComparative2025-13-15.xlsx"), None);
        assert_eq!(document_date("report.xlsx"), None);
    }

    #[test]
    fn raw_grid_document_is_segmented() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = config(root.path());
        ensure_directories(&config)?;
        let path = process_document(&report(&["Dec"], 250.0), date(1), &config)?.unwrap();
        assert!(path.ends_with("FOB_20251001.xlsx"));
        assert!(process_document(&RawGrid::new(), date(2), &config)?.is_none());
        Ok(())
    }

    #[test]
    fn full_run_is_idempotent() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = config(root.path());
        ensure_directories(&config)?;
        init_summary(&config.summary_path, false)?;
        assert!(init_summary(&config.summary_path, false).is_err());

        write_report(&config.data_dir, "RJODailyFOBComparative2025-10-01202510.xlsx", &report(&["Dec", "Mar"], 250.0))?;
        write_report(&config.data_dir, "RJODailyFOBComparative2025-10-02202510.xlsx", &report(&["Dec", "Mar"], 251.0))?;
        write_report(&config.data_dir, "RJODailyFOBComparativeLatest.xlsx", &report(&["Dec"], 1.0))?;

        let documents = process_daily_documents(&config)?;
        assert_eq!(documents, DocumentPass { written: 2, existing: 0, skipped: 1 });
        let summary = update_summary_workbook(&config)?;
        assert_eq!(summary, SummaryPass { updated: 28, unchanged: 0, skipped: 0, rows_added: 112 });

        let workbook = XlsxWorkbook::open(&config.summary_path)?;
        let (location, table) = load_product_table(&workbook, Product::BrazilianSoyoil)?;
        assert_eq!(location.range.to_string(), "A1:F5");
        assert_eq!(table.columns[1], "vs");
        assert_eq!(table.rows[2][0], CellValue::from("Dec"));
        assert_eq!(table.rows[2][3], CellValue::Number(251.0));
        assert_eq!(table.rows[2][4], CellValue::Number(0.5));
        assert_eq!(table.rows[2][5], CellValue::Date(date(2)));

        let documents = process_daily_documents(&config)?;
        assert_eq!(documents, DocumentPass { written: 0, existing: 2, skipped: 1 });
        let summary = update_summary_workbook(&config)?;
        assert_eq!(summary, SummaryPass { updated: 0, unchanged: 28, skipped: 0, rows_added: 0 });

        write_report(&config.data_dir, "RJODailyFOBComparative2025-10-03202510.xlsx", &report(&["Dec"], 252.0))?;
        run(&config)?;
        let workbook = XlsxWorkbook::open(&config.summary_path)?;
        let (location, table) = load_product_table(&workbook, Product::GulfCorn)?;
        assert_eq!(location.range.to_string(), "A1:F6");
        assert_eq!(table.rows[4][5], CellValue::Date(date(3)));
        Ok(())
    }

    #[test]
    fn pdf_reports_are_read_by_default() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = Config {
            document_glob: Config::default().document_glob,
            ..config(root.path())
        };
        ensure_directories(&config)?;
        init_summary(&config.summary_path, false)?;
        write_grid_pdf(&config.data_dir.join("RJODailyFOBComparative2025-10-01202510.pdf"), &report(&["Dec", "Mar"], 250.0))?;
        write_report(&config.data_dir, "RJODailyFOBComparative2025-10-02202510.xlsx", &report(&["Dec"], 251.0))?;

        let documents = process_daily_documents(&config)?;
        assert_eq!(documents, DocumentPass { written: 1, existing: 0, skipped: 0 });
        let summary = update_summary_workbook(&config)?;
        assert_eq!(summary, SummaryPass { updated: 28, unchanged: 0, skipped: 0, rows_added: 56 });

        let workbook = XlsxWorkbook::open(&config.summary_path)?;
        let (_, table) = load_product_table(&workbook, Product::IndianSoymeal)?;
        assert_eq!(table.rows[1][0], CellValue::from("Mar"));
        assert_eq!(table.rows[1][3], CellValue::Number(250.0));
        assert_eq!(table.rows[1][5], CellValue::Date(date(1)));
        Ok(())
    }

    #[test]
    fn missing_tables_are_skipped() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = config(root.path());
        ensure_directories(&config)?;
        WorkbookWriter::new()
            .add_table_sheet("Gulf_Corn", "Gulf_Corn", vec![header_for("vs").iter().map(|name| CellValue::from(name.as_str())).collect()])?
            .save(&config.summary_path)?;
        process_document(&report(&["Dec"], 250.0), date(1), &config)?;

        let summary = update_summary_workbook(&config)?;
        assert_eq!(summary, SummaryPass { updated: 1, unchanged: 0, skipped: 27, rows_added: 1 });
        Ok(())
    }

    #[test]
    fn missing_summary_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        assert!(update_summary_workbook(&config(root.path())).is_err());
    }
}
