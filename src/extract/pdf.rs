//! Grid extraction from the first page of a PDF report.
//!
//! The page's content stream is replayed just far enough to know where every
//! piece of text starts. Text runs are grouped into rows by baseline, and the
//! rows with the most runs fix the column anchors: a run belongs to the last
//! anchor starting at or left of it. Text spanning several columns therefore
//! lands in the column where it starts.
use crate::error::LedgerError;
use crate::extract::GridSource;
use crate::segment::RawGrid;
use lopdf::content::Content;
use lopdf::content::Operation;
use lopdf::Document;
use lopdf::Object;
use lopdf::ObjectId;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::warn;

/// Affine transform `[a b c d e f]` as used by `cm` and `Tm`
type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Kerning (thousandths of an em) wide enough to stand for a space inside `TJ`
const TJ_SPACE: f32 = -250.0;

/// Tuning for turning text positions into rows and columns, in points.
#[derive(Clone, Debug, PartialEq)]
pub struct PdfLayout {
    /// Baselines closer than this belong to the same row
    pub row_tolerance: f32,
    /// Run starts further apart than this open a new column
    pub column_gap: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        PdfLayout {
            row_tolerance: 3.0,
            column_gap: 10.0,
        }
    }
}

/// A piece of text and the page position where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl TextRun {
    pub fn new(x: f32, y: f32, text: &str) -> Self {
        TextRun { x, y, text: text.to_owned() }
    }
}

/// A report PDF; only its first page is read.
#[derive(Clone, Debug)]
pub struct PdfGridSource {
    path: PathBuf,
    layout: PdfLayout,
}

impl PdfGridSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        PdfGridSource {
            path: path.as_ref().to_path_buf(),
            layout: PdfLayout::default(),
        }
    }
}

impl GridSource for PdfGridSource {
    fn first_page_grid(&self) -> Result<Option<RawGrid>, LedgerError> {
        let shown_path = self.path.display();
        let document = Document::load(&self.path)?;
        let Some(&page_id) = document.get_pages().values().next() else {
            warn!(path = %shown_path, "no pages found in document");
            return Ok(None);
        };
        let runs = page_text_runs(&document, page_id)?;
        if runs.is_empty() {
            warn!(path = %shown_path, "no table found on first page");
            return Ok(None);
        }
        let grid = layout_grid(&runs, &self.layout);
        debug!(path = %shown_path, runs = runs.len(), rows = grid.len(), "read first page grid");
        Ok(Some(grid))
    }
}

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut values = [0.0; N];
    for (value, operand) in values.iter_mut().zip(operands) {
        *value = number(operand)?;
    }
    (operands.len() >= N).then_some(values)
}

/// PDF text strings: UTF-16BE with a byte order mark, else one byte per character.
fn decode_text(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().copied().map(char::from).collect(),
    }
}

/// Text of a `Tj`/`'`/`"` string or a `TJ` array.
fn shown_text(operand: &Object) -> String {
    match operand {
        Object::String(bytes, _) => decode_text(bytes),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_text(bytes)),
                    other if number(other).is_some_and(|kerning| kerning <= TJ_SPACE) => text.push(' '),
                    _ => (),
                }
            }
            text
        }
        _ => String::new(),
    }
}

/// Replays the text operators of a content stream.
#[derive(Default)]
struct TextCursor {
    ctm: Matrix,
    saved: Vec<Matrix>,
    line: Matrix,
    text: Matrix,
    leading: f32,
    /// Whether the next shown text starts a new run
    moved: bool,
    runs: Vec<TextRun>,
}

impl TextCursor {
    fn new() -> Self {
        TextCursor {
            ctm: IDENTITY,
            line: IDENTITY,
            text: IDENTITY,
            moved: true,
            ..Default::default()
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line);
        self.text = self.line;
        self.moved = true;
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(run) if !self.moved => run.text.push_str(&text),
            _ => {
                let origin = multiply(&self.text, &self.ctm);
                self.runs.push(TextRun { x: origin[4], y: origin[5], text });
            }
        }
        self.moved = false;
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => self.ctm = self.saved.pop().unwrap_or(IDENTITY),
            "cm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    self.ctm = multiply(&matrix, &self.ctm);
                }
            }
            "BT" => {
                self.line = IDENTITY;
                self.text = IDENTITY;
                self.moved = true;
            }
            "Tm" => {
                if let Some(matrix) = numbers::<6>(operands) {
                    self.line = matrix;
                    self.text = matrix;
                    self.moved = true;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "TL" => self.leading = operands.first().and_then(number).unwrap_or(self.leading),
            "T*" => self.move_line(0.0, -self.leading),
            "Tj" | "TJ" => {
                if let Some(operand) = operands.first() {
                    self.show(shown_text(operand));
                }
            }
            "'" => {
                self.move_line(0.0, -self.leading);
                if let Some(operand) = operands.first() {
                    self.show(shown_text(operand));
                }
            }
            "\"" => {
                self.move_line(0.0, -self.leading);
                if let Some(operand) = operands.get(2) {
                    self.show(shown_text(operand));
                }
            }
            _ => (),
        }
    }
}

/// Positioned text runs of one page, in content stream order.
pub fn page_text_runs(document: &Document, page_id: ObjectId) -> Result<Vec<TextRun>, LedgerError> {
    let content = Content::decode(&document.get_page_content(page_id)?)?;
    let mut cursor = TextCursor::new();
    for operation in &content.operations {
        cursor.apply(operation);
    }
    Ok(cursor.runs)
}

/// Starts of the column clusters, left to right.
fn column_anchors(mut starts: Vec<f32>, gap: f32) -> Vec<f32> {
    starts.sort_by(f32::total_cmp);
    let mut anchors: Vec<f32> = Vec::new();
    let mut previous = None::<f32>;
    for x in starts {
        if previous.map_or(true, |last| x - last > gap) {
            anchors.push(x);
        }
        previous = Some(x);
    }
    anchors
}

/// Arranges text runs into a grid: rows top to bottom, cells left to right, blanks as `None`.
pub fn layout_grid(runs: &[TextRun], layout: &PdfLayout) -> RawGrid {
    let mut ordered: Vec<&TextRun> = runs.iter().filter(|run| !run.text.trim().is_empty()).collect();
    ordered.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    let mut baseline = f32::NAN;
    for run in ordered {
        match rows.last_mut() {
            Some(row) if (baseline - run.y).abs() <= layout.row_tolerance => row.push(run),
            _ => {
                baseline = run.y;
                rows.push(vec![run]);
            }
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
    let starts = rows
        .iter()
        .filter(|row| row.len() == widest)
        .flat_map(|row| row.iter().map(|run| run.x))
        .collect();
    let anchors = column_anchors(starts, layout.column_gap);
    let slack = layout.column_gap / 2.0;

    rows.into_iter()
        .map(|row| {
            let mut cells: Vec<Option<String>> = vec![None; anchors.len().max(1)];
            for run in row {
                let col = anchors.iter().rposition(|anchor| *anchor <= run.x + slack).unwrap_or(0);
                let text = run.text.trim();
                match &mut cells[col] {
                    Some(cell) => {
                        cell.push(' ');
                        cell.push_str(text);
                    }
                    cell => *cell = Some(text.to_owned()),
                }
            }
            cells
        })
        .collect()
}

/// Writes a one-page PDF placing every non-empty cell of `grid` on a regular lattice.
#[cfg(test)]
pub(crate) fn write_grid_pdf(path: &Path, grid: &RawGrid) -> Result<(), LedgerError> {
    use lopdf::dictionary;
    use lopdf::Stream;

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (row, cells) in grid.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let Some(text) = cell else { continue };
            let x = 20.0 + 46.0 * col as f32;
            let y = 800.0 - 11.0 * row as f32;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 7.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text.as_str())]));
            operations.push(Operation::new("ET", vec![]));
        }
    }
    let content = Content { operations };
    let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    document.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 842.into(), 842.into()],
    }));
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|value| Some(value.to_string()).filter(|value| !value.is_empty())).collect()
    }

    #[test]
    fn runs_become_rows_and_columns() {
        let runs = vec![
            TextRun::new(100.0, 700.0, "SRW US Gulf"),
            TextRun::new(100.0, 688.0, "vs W"),
            TextRun::new(150.0, 688.0, "Chg"),
            TextRun::new(200.0, 688.0, "Flat"),
            TextRun::new(20.0, 676.4, "Dec"),
            TextRun::new(104.0, 676.0, "75"),
            TextRun::new(150.0, 676.0, "-2.5"),
            TextRun::new(196.0, 675.0, "245.5"),
            TextRun::new(21.0, 664.0, "Mar"),
            TextRun::new(150.0, 664.0, "+1"),
        ];
        let grid = layout_grid(&runs, &PdfLayout::default());
        assert_eq!(grid, vec![
            cells(&["", "SRW US Gulf", "", ""]),
            cells(&["", "vs W", "Chg", "Flat"]),
            cells(&["Dec", "75", "-2.5", "245.5"]),
            cells(&["Mar", "", "+1", ""]),
        ]);
    }

    #[test]
    fn runs_in_one_cell_are_joined() {
        let runs = vec![
            TextRun::new(20.0, 500.0, "Prices are"),
            TextRun::new(70.0, 500.0, "indicative"),
            TextRun::new(20.0, 480.0, "Dec"),
            TextRun::new(120.0, 480.0, "12"),
            TextRun::new(170.0, 480.0, "-1"),
        ];
        let grid = layout_grid(&runs, &PdfLayout::default());
        assert_eq!(grid, vec![cells(&["Prices are indicative", "", ""]), cells(&["Dec", "12", "-1"])]);
        assert!(layout_grid(&[], &PdfLayout::default()).is_empty());
    }

    #[test]
    fn text_operators_track_positions() {
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 20.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Dec")]),
            Operation::new("Tj", vec![Object::string_literal("25")]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("T*", vec![]),
            Operation::new("TJ", vec![Object::Array(vec![
                Object::string_literal("vs"),
                Object::Integer(-300),
                Object::string_literal("W"),
            ])]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 200.into(), 700.into()]),
            Operation::new("Tj", vec![Object::String(vec![0xFE, 0xFF, 0x00, 0x2B, 0x00, 0x31], lopdf::StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        let mut cursor = TextCursor::new();
        operations.iter().for_each(|operation| cursor.apply(operation));
        assert_eq!(cursor.runs, vec![
            TextRun::new(60.0, 720.0, "Dec25"),
            TextRun::new(60.0, 708.0, "vs W"),
            TextRun::new(210.0, 720.0, "+1"),
        ]);
        assert_eq!(cursor.ctm, IDENTITY);
    }

    #[test]
    fn first_page_of_a_pdf() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("report.pdf");
        let grid = vec![
            cells(&["", "Gulf Corn", "", "", ""]),
            cells(&["", "vs Z", "Chg", "Flat", "Chg"]),
            cells(&["Dec", "75", "-2", "210.5", "+0.5"]),
        ];
        write_grid_pdf(&path, &grid)?;
        assert_eq!(PdfGridSource::new(&path).first_page_grid()?, Some(grid));
        Ok(())
    }

    #[test]
    fn pdf_without_pages_has_no_grid() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("empty.pdf");
        let mut document = Document::with_version("1.5");
        let pages_id = document.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        document.save(&path)?;
        assert!(PdfGridSource::new(&path).first_page_grid()?.is_none());
        Ok(())
    }
}
