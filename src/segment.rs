//! # Report segmentation
//!
//! A daily comparative report is a grid of text cells holding seven sections of
//! four products each. Every section opens with a header row naming its products,
//! followed by a sub-header row carrying each block's comparison label (`vs W`,
//! `vs Z`, ...) and then one row per contract month. Each product occupies a block
//! of four columns: basis, first change, flat price and second change.
//!
//! ```text
//!        | SRW US Gulf             | HRW Texas Gulf          | ...
//!        | vs W  | Chg | Flat| Chg | vs KW | Chg | Flat| Chg | ...
//! Dec    |  75   | -2  | 245 |  1  |  ...
//! Mar    |  80   | -2  | 250 |  1  |  ...
//! ```
//!
//! Boundaries are inferred from the cells alone, so the segmenter tolerates a
//! missing or extra section and logs the discrepancy instead of failing.
use crate::product::Product;
use crate::record::ProductBatch;
use crate::record::ProductRecord;
use crate::record::DEFAULT_COMPARISON_LABEL;
use crate::spreadsheet::CellValue;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;
use tracing::trace;
use tracing::warn;

/// Rows of optional cell text, as extracted from the first page of a report.
pub type RawGrid = Vec<Vec<Option<String>>>;

/// Marker distinguishing a sub-header (comparison label) from a product header
const COMPARISON_MARKER: &str = "vs";
/// Month cells containing these words are footnotes, not contract months
const FOOTNOTE_MARKERS: [&str; 2] = ["Price", "Disclaimer"];

/// Role of a grid row, decided from its first two cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// Opens a section: product names with an empty first cell
    Header,
    /// Comparison labels of the section's blocks
    SubHeader,
    /// A labelled row, possibly a contract month
    Data,
    Other,
}

/// Trimmed text of a cell; missing and blank cells read as ""
fn cell_text(row: &[Option<String>], col: usize) -> &str {
    row.get(col).and_then(|cell| cell.as_deref()).map(str::trim).unwrap_or("")
}

/// Classifies a row without looking at its neighbours.
pub fn classify_row(row: &[Option<String>]) -> RowKind {
    let first = cell_text(row, 0);
    let second = cell_text(row, 1);
    if second.contains(COMPARISON_MARKER) {
        RowKind::SubHeader
    } else if !second.is_empty() && first.is_empty() {
        RowKind::Header
    } else if !first.is_empty() {
        RowKind::Data
    } else {
        RowKind::Other
    }
}

#[derive(Clone, Debug)]
pub struct SegmentOptions {
    /// Sections a well-formed report contains
    pub expected_sections: usize,
    /// Longest month label accepted; longer labels are notes spilling into the grid
    pub max_month_len: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        SegmentOptions {
            expected_sections: Product::ALL.len() / Product::PER_SECTION,
            max_month_len: 15,
        }
    }
}

/// Splits a report grid into per-product records.
#[derive(Clone, Debug, Default)]
pub struct Segmenter {
    options: SegmentOptions,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SegmentOptions) -> Self {
        Segmenter { options }
    }

    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Whether a first-column label names a contract month
    pub fn is_month_label(&self, label: &str) -> bool {
        let label = label.trim();
        !label.is_empty()
            && !FOOTNOTE_MARKERS.iter().any(|marker| label.contains(marker))
            && label.chars().count() <= self.options.max_month_len
    }

    /// Extracts the records of every product found in the grid.
    ///
    /// # Arguments
    /// * `grid` - Report cells, row by row
    /// * `date` - Report date stamped on every record
    ///
    /// # Returns
    /// Records keyed by product, each list in report row order. Products whose
    /// section is missing from the grid have no entry.
    pub fn segment(&self, grid: &[Vec<Option<String>>], date: NaiveDate) -> BTreeMap<Product, ProductBatch> {
        let mut batches = BTreeMap::new();
        if grid.is_empty() {
            warn!(%date, "report grid is empty");
            return batches;
        }

        let headers: Vec<usize> = grid
            .iter()
            .enumerate()
            .filter(|(_, row)| classify_row(row) == RowKind::Header)
            .map(|(index, _)| index)
            .collect();
        if headers.len() != self.options.expected_sections {
            warn!(
                %date,
                found = headers.len(),
                expected = self.options.expected_sections,
                "unexpected number of report sections"
            );
        }

        for (section, &start) in headers.iter().enumerate() {
            let end = headers.get(section + 1).copied().unwrap_or(grid.len());
            self.segment_section(section, &grid[start..end], date, &mut batches);
        }
        debug!(%date, sections = headers.len(), products = batches.len(), "segmented report");
        batches
    }

    fn segment_section(
        &self,
        section: usize,
        rows: &[Vec<Option<String>>],
        date: NaiveDate,
        batches: &mut BTreeMap<Product, ProductBatch>,
    ) {
        let sub_header = rows.get(1).map(Vec::as_slice).unwrap_or_default();
        let months: Vec<&Vec<Option<String>>> = rows
            .iter()
            .skip(2)
            .filter(|row| {
                let accepted = self.is_month_label(cell_text(row, 0));
                if !accepted {
                    trace!(section, label = cell_text(row, 0), "skipping non-month row");
                }
                accepted
            })
            .collect();

        for block in 0..Product::PER_SECTION {
            let Some(product) = Product::from_index(section * Product::PER_SECTION + block) else {
                debug!(section, "section lies beyond the product catalogue");
                return;
            };
            let first_col = 1 + block * Product::PER_SECTION;
            let comparison_label = match cell_text(sub_header, first_col) {
                "" => DEFAULT_COMPARISON_LABEL,
                label => label,
            };
            let records = months
                .iter()
                .map(|row| ProductRecord {
                    month: cell_text(row, 0).to_owned(),
                    comparison_label: comparison_label.to_owned(),
                    basis: CellValue::parse_text(cell_text(row, first_col)),
                    chg1: CellValue::parse_text(cell_text(row, first_col + 1)),
                    flat: CellValue::parse_text(cell_text(row, first_col + 2)),
                    chg2: CellValue::parse_text(cell_text(row, first_col + 3)),
                    date,
                })
                .collect();
            batches.insert(product, records);
        }
    }
}

/// Segments a grid with the default options.
pub fn segment(grid: &[Vec<Option<String>>], date: NaiveDate) -> BTreeMap<Product, ProductBatch> {
    Segmenter::new().segment(grid, date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|cell| if cell.is_empty() { None } else { Some(cell.to_string()) })
            .collect()
    }

    /// A section with four named blocks and the given month rows.
    fn section(index: usize, months: &[&str]) -> RawGrid {
        let mut grid = Vec::new();
        let mut header = vec![None];
        let mut sub_header = vec![None];
        for block in 0..4 {
            header.extend([Some(format!("Product {index}.{block}")), None, None, None]);
            sub_header.extend([Some(format!("vs {block}")), Some("Chg".into()), Some("Flat".into()), Some("Chg".into())]);
        }
        grid.push(header);
        grid.push(sub_header);
        for (offset, month) in months.iter().enumerate() {
            let mut cells = vec![Some(month.to_string())];
            for block in 0..4 {
                let base = (index * 100 + block * 10 + offset) as f64;
                cells.extend([Some(base.to_string()), Some("+1.5".into()), Some(format!("{}", base + 200.0)), None]);
            }
            grid.push(cells);
        }
        grid
    }

    fn report(sections: usize, months: &[&str]) -> RawGrid {
        (0..sections).flat_map(|index| section(index, months)).collect()
    }

    #[test]
    fn classify_rows() {
        assert_eq!(classify_row(&row(&["", "SRW US Gulf", "", "", "", "HRW"])), RowKind::Header);
        assert_eq!(classify_row(&row(&["", "vs W", "Chg"])), RowKind::SubHeader);
        assert_eq!(classify_row(&row(&["Dec", "75"])), RowKind::Data);
        assert_eq!(classify_row(&row(&["Dec", ""])), RowKind::Data);
        assert_eq!(classify_row(&row(&["Note", "vs"])), RowKind::SubHeader);
        assert_eq!(classify_row(&row(&[])), RowKind::Other);
        assert_eq!(classify_row(&row(&["", "  "])), RowKind::Other);
    }

    #[test]
    fn month_labels() {
        let segmenter = Segmenter::new();
        assert!(segmenter.is_month_label("Dec"));
        assert!(segmenter.is_month_label(" Mar 26 "));
        assert!(!segmenter.is_month_label(""));
        assert!(!segmenter.is_month_label("Price in USD/t"));
        assert!(!segmenter.is_month_label("Disclaimer"));
        assert!(!segmenter.is_month_label("Sixteen chars!!!"));
        assert!(segmenter.is_month_label("Fifteen chars!!"));
    }

    #[test]
    fn full_report_yields_every_product() {
        let batches = segment(&report(7, &["Dec", "Mar", "May"]), date());
        assert_eq!(batches.len(), 28);
        assert!(batches.values().all(|records| records.len() == 3));
        assert_eq!(batches.keys().copied().collect::<Vec<_>>(), Product::ALL.to_vec());

        let gulf_corn = &batches[&Product::GulfCorn];
        assert_eq!(gulf_corn[1].month, "Mar");
        assert_eq!(gulf_corn[1].comparison_label, "vs 0");
        assert_eq!(gulf_corn[1].basis, CellValue::Number(301.0));
        assert_eq!(gulf_corn[1].chg1, CellValue::Number(1.5));
        assert_eq!(gulf_corn[1].flat, CellValue::Number(501.0));
        assert_eq!(gulf_corn[1].chg2, CellValue::Empty);
        assert_eq!(gulf_corn[1].date, date());

        let olein = &batches[&Product::MalaysianOlein];
        assert_eq!(olein[0].comparison_label, "vs 3");
        assert_eq!(olein[0].basis, CellValue::Number(530.0));
    }

    #[test]
    fn missing_section_is_tolerated() {
        let batches = segment(&report(6, &["Dec"]), date());
        assert_eq!(batches.len(), 24);
        assert!(!batches.contains_key(&Product::GulfSoymeal));
    }

    #[test]
    fn extra_section_is_ignored() {
        let batches = segment(&report(8, &["Dec"]), date());
        assert_eq!(batches.len(), 28);
        assert_eq!(batches[&Product::IndianSoymeal][0].basis, CellValue::Number(630.0));
    }

    #[test]
    fn footnotes_and_long_labels_are_excluded() {
        let mut grid = report(7, &["Dec", "A very long footnote label", "Mar"]);
        grid.push(row(&["Prices in USD/t FOB"]));
        grid.push(row(&["Disclaimer: indicative only"]));
        let batches = segment(&grid, date());
        for product in &Product::ALL[..4] {
            let months: Vec<&str> = batches[product].iter().map(|record| record.month.as_str()).collect();
            assert_eq!(months, vec!["Dec", "Mar"]);
        }
        assert_eq!(batches[&Product::IndianSoymeal].len(), 2);
    }

    #[test]
    fn blank_comparison_label_falls_back() {
        let mut grid = report(7, &["Dec"]);
        grid[1][5] = None;
        let batches = segment(&grid, date());
        assert_eq!(batches[&Product::HrwTexasGulf][0].comparison_label, "vs");
        assert_eq!(batches[&Product::SrwUsGulf][0].comparison_label, "vs 0");
    }

    #[test]
    fn short_rows_yield_empty_cells() {
        let mut grid = report(7, &["Dec"]);
        grid[2].truncate(3);
        let batches = segment(&grid, date());
        let record = &batches[&Product::SrwUsGulf][0];
        assert_eq!(record.chg1, CellValue::Number(1.5));
        assert_eq!(record.flat, CellValue::Empty);
        assert_eq!(batches[&Product::WhiteWheatUsPnw][0].basis, CellValue::Empty);
    }

    #[test]
    fn empty_grid_yields_nothing() {
        assert!(segment(&[], date()).is_empty());
    }

    #[test]
    fn segmentation_is_deterministic() {
        let grid = report(7, &["Dec", "Mar"]);
        assert_eq!(segment(&grid, date()), segment(&grid, date()));
    }

    #[test]
    fn month_limit_is_configurable() {
        let segmenter = Segmenter::with_options(SegmentOptions { max_month_len: 3, ..Default::default() });
        let batches = segmenter.segment(&report(7, &["Dec", "Mar 26"]), date());
        assert_eq!(batches[&Product::GulfCorn].len(), 1);
    }
}
