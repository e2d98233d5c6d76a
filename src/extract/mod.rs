//! Sources of report grids.
//!
//! Daily reports arrive as PDF files; [`PdfGridSource`] lays out the text of their
//! first page as a grid. [`SheetGridSource`] reads a page that was already
//! extracted to the first worksheet of an xlsx file.
pub mod pdf;

use crate::error::LedgerError;
use crate::segment::RawGrid;
use crate::spreadsheet::XlsxWorkbook;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

pub use pdf::PdfGridSource;

pub trait GridSource {
    /// Cells of the document's first page, row by row. `None` when the document
    /// holds no page, or nothing to lay out on it.
    fn first_page_grid(&self) -> Result<Option<RawGrid>, LedgerError>;
}

/// Picks the grid source for a report file by its extension: `.xlsx` files are
/// read as extracted pages, anything else as PDF.
pub fn source_for(path: &Path) -> Box<dyn GridSource> {
    let is_sheet = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"));
    if is_sheet {
        Box::new(SheetGridSource::new(path))
    } else {
        Box::new(PdfGridSource::new(path))
    }
}

/// A report page exported to the first worksheet of an xlsx file.
#[derive(Clone, Debug)]
pub struct SheetGridSource {
    path: PathBuf,
}

impl SheetGridSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SheetGridSource { path: path.as_ref().to_path_buf() }
    }
}

impl GridSource for SheetGridSource {
    fn first_page_grid(&self) -> Result<Option<RawGrid>, LedgerError> {
        let workbook = XlsxWorkbook::open(&self.path)?;
        let grid = workbook
            .first_sheet()
            .map(|sheet| sheet.text_rows())
            .filter(|rows| !rows.is_empty());
        debug!(
            path = %self.path.display(),
            rows = grid.as_ref().map_or(0, Vec::len),
            "read first page grid"
        );
        Ok(grid)
    }
}

/// An already extracted grid.
impl GridSource for RawGrid {
    fn first_page_grid(&self) -> Result<Option<RawGrid>, LedgerError> {
        Ok(Some(self.clone()).filter(|rows| !rows.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;
    use crate::spreadsheet::WorkbookWriter;

    #[test]
    fn reads_first_sheet_as_text() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("page.xlsx");
        WorkbookWriter::new()
            .add_sheet("Page 1", vec![
                vec![CellValue::Empty, "SRW US Gulf".into()],
                vec!["Dec".into(), 75.0.into(), (-2.5).into()],
            ])?
            .add_sheet("Page 2", vec![vec!["ignored".into()]])?
            .save(&path)?;

        let grid = SheetGridSource::new(&path).first_page_grid()?.unwrap();
        assert_eq!(grid, vec![
            vec![None, Some("SRW US Gulf".to_owned()), None],
            vec![Some("Dec".to_owned()), Some("75".to_owned()), Some("-2.5".to_owned())],
        ]);
        Ok(())
    }

    #[test]
    fn sources_follow_the_file_extension() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let grid: RawGrid = vec![vec![None, Some("Gulf Corn".to_owned())], vec![Some("Dec".to_owned()), Some("75".to_owned())]];
        let pdf_path = directory.path().join("RJODailyFOBComparative2025-10-01.PDF");
        pdf::write_grid_pdf(&pdf_path, &grid)?;
        let sheet_path = directory.path().join("RJODailyFOBComparative2025-10-01.xlsx");
        WorkbookWriter::new()
            .add_sheet("Page 1", vec![vec![CellValue::Empty, "Gulf Corn".into()], vec!["Dec".into(), "75".into()]])?
            .save(&sheet_path)?;

        assert_eq!(source_for(&pdf_path).first_page_grid()?, Some(grid.clone()));
        assert_eq!(source_for(&sheet_path).first_page_grid()?, Some(grid));
        Ok(())
    }

    #[test]
    fn blank_page_has_no_grid() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("blank.xlsx");
        WorkbookWriter::new().add_sheet("Page 1", Vec::new())?.save(&path)?;
        assert!(SheetGridSource::new(&path).first_page_grid()?.is_none());
        assert!(RawGrid::new().first_page_grid()?.is_none());
        Ok(())
    }
}
