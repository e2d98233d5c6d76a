use crate::error::LedgerError;
use crate::helpers::xml::XmlBuilder;
use crate::spreadsheet::cell::date_to_serial;
use crate::spreadsheet::cell::datetime_to_serial;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use std::collections::BTreeMap;

/// A cell as held in memory: resolved value plus what is needed to write it back.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StoredCell {
    pub(crate) value: CellValue,
    /// Index into the workbook's cell formats (`s` attribute)
    pub(crate) style: Option<usize>,
    /// Formula, written back verbatim until the cell is overwritten
    pub(crate) formula: Option<Formula>,
}

/// Contents of a cell's `<f>` element. Shared formulas keep `t`, `si` and `ref` here;
/// their dependent cells carry no text at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Formula {
    pub(crate) text: String,
    pub(crate) attributes: Vec<(String, String)>,
}

/// In-memory worksheet. Coordinates are 0-based (row, col).
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-blank cells, ordered by row then column
    pub(crate) cells: BTreeMap<(usize, usize), StoredCell>,
    /// Row attributes other than `r` and `spans` (heights, hidden flags)
    pub(crate) row_attributes: BTreeMap<usize, Vec<(String, String)>>,
    /// Set once a cell has been written or cleared
    pub(crate) dirty: bool,
}

impl Sheet {
    /// Upper bound on how far up a column is searched for a style to inherit
    const STYLE_LOOKBACK: usize = 64;

    pub(crate) fn new(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value at a 0-based coordinate; blank cells read as `None`.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells
            .get(&(row, col))
            .map(|cell| &cell.value)
            .filter(|value| !matches!(value, CellValue::Empty))
    }

    /// Writes a value, keeping the cell's style. A cell without a style inherits the
    /// style of the nearest styled cell above it in the same column, else `fallback_style`.
    pub(crate) fn set(&mut self, row: usize, col: usize, value: CellValue, fallback_style: Option<usize>) {
        let style = match self.cells.get(&(row, col)).and_then(|cell| cell.style) {
            Some(style) => Some(style),
            None => self.inherited_style(row, col).or(fallback_style),
        };
        self.cells.insert((row, col), StoredCell { value, style, formula: None });
        self.dirty = true;
    }

    /// Empties a cell; its style is kept so the cell stays formatted like its neighbours.
    pub(crate) fn clear(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.cells.get_mut(&(row, col)) {
            if cell.style.is_some() {
                cell.value = CellValue::Empty;
                cell.formula = None;
            } else {
                self.cells.remove(&(row, col));
            }
            self.dirty = true;
        }
    }

    fn inherited_style(&self, row: usize, col: usize) -> Option<usize> {
        (row.saturating_sub(Self::STYLE_LOOKBACK)..row)
            .rev()
            .find_map(|above| self.cells.get(&(above, col)).and_then(|cell| cell.style))
    }

    /// Smallest rectangle (first row, first col, last row, last col) holding a non-blank value.
    pub fn bounds(&self) -> Option<(usize, usize, usize, usize)> {
        self.cells
            .iter()
            .filter(|(_, cell)| !matches!(cell.value, CellValue::Empty))
            .fold(None, |bounds, (&(row, col), _)| match bounds {
                None => Some((row, col, row, col)),
                Some((r0, c0, r1, c1)) => Some((r0.min(row), c0.min(col), r1.max(row), c1.max(col))),
            })
    }

    /// Plain-text rows from the top-left corner (A1) to the last used cell.
    /// Blank cells are `None`; values are rendered with their display text.
    pub fn text_rows(&self) -> Vec<Vec<Option<String>>> {
        let Some((_, _, last_row, last_col)) = self.bounds() else {
            return Vec::new();
        };
        let mut rows = vec![vec![None; last_col + 1]; last_row + 1];
        for (&(row, col), cell) in &self.cells {
            if !matches!(cell.value, CellValue::Empty) {
                rows[row][col] = Some(cell.value.to_string());
            }
        }
        rows
    }

    /// Rows of values covering the 0-based inclusive rectangle, blanks as `CellValue::Empty`.
    pub fn values(&self, first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Vec<Vec<CellValue>> {
        (first_row..=last_row)
            .map(|row| {
                (first_col..=last_col)
                    .map(|col| self.get(row, col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Writes the `<sheetData>` element for the current cells.
    pub(crate) fn write_sheet_data(&self, builder: &mut XmlBuilder, is_1904: bool) -> Result<(), LedgerError> {
        builder.start("sheetData", &[])?;
        let mut rows: BTreeMap<usize, Vec<(usize, &StoredCell)>> = BTreeMap::new();
        for row in self.row_attributes.keys() {
            rows.entry(*row).or_default();
        }
        for (&(row, col), cell) in &self.cells {
            if matches!(cell.value, CellValue::Empty) && cell.style.is_none() && cell.formula.is_none() {
                continue;
            }
            rows.entry(row).or_default().push((col, cell));
        }

        for (row, cells) in rows {
            let number = (row + 1).to_string();
            let mut attributes: Vec<(&str, &str)> = vec![("r", number.as_str())];
            if let Some(extra) = self.row_attributes.get(&row) {
                attributes.extend(extra.iter().map(|(key, value)| (key.as_str(), value.as_str())));
            }
            if cells.is_empty() {
                builder.empty("row", &attributes)?;
                continue;
            }
            builder.start("row", &attributes)?;
            for (col, cell) in cells {
                write_cell(builder, row, col, cell, is_1904)?;
            }
            builder.end("row")?;
        }
        builder.end("sheetData")
    }
}

fn write_cell(builder: &mut XmlBuilder, row: usize, col: usize, cell: &StoredCell, is_1904: bool) -> Result<(), LedgerError> {
    let reference = index_to_reference(row, col);
    let style = cell.style.map(|style| style.to_string());
    let mut attributes: Vec<(&str, &str)> = vec![("r", reference.as_str())];
    if let Some(style) = &style {
        attributes.push(("s", style.as_str()));
    }

    let (kind, value) = match &cell.value {
        CellValue::Empty => (None, None),
        CellValue::Text(text) if cell.formula.is_some() => (Some("str"), Some(text.to_owned())),
        CellValue::Text(text) => (Some("inlineStr"), Some(text.to_owned())),
        CellValue::Number(number) => (None, Some(number.to_string())),
        CellValue::Bool(value) => (Some("b"), Some(if *value { "1" } else { "0" }.to_owned())),
        CellValue::Date(date) => (None, Some(date_to_serial(*date, is_1904).to_string())),
        CellValue::DateTime(datetime) => (None, Some(datetime_to_serial(*datetime, is_1904).to_string())),
        CellValue::Error(code) => (Some("e"), Some(code.to_owned())),
    };
    if let Some(kind) = kind {
        attributes.push(("t", kind));
    }

    if value.is_none() && cell.formula.is_none() {
        return builder.empty("c", &attributes);
    }
    builder.start("c", &attributes)?;
    if let Some(formula) = &cell.formula {
        let attributes: Vec<(&str, &str)> = formula
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        builder.text_element("f", &attributes, &formula.text)?;
    }
    match (kind, value) {
        (Some("inlineStr"), Some(text)) => {
            builder.start("is", &[])?;
            builder.text_element("t", &[("xml:space", "preserve")], &text)?;
            builder.end("is")?;
        }
        (_, Some(value)) => builder.text_element("v", &[], &value)?,
        (_, None) => (),
    }
    builder.end("c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sheet_with(cells: &[(usize, usize, CellValue, Option<usize>)]) -> Sheet {
        let mut sheet = Sheet::new("Test");
        for (row, col, value, style) in cells {
            sheet.cells.insert((*row, *col), StoredCell { value: value.clone(), style: *style, formula: None });
        }
        sheet
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Test");
        assert!(sheet.is_empty());
        assert_eq!(sheet.bounds(), None);
        assert!(sheet.text_rows().is_empty());
    }

    #[test]
    fn set_inherits_style_from_above() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let mut sheet = sheet_with(&[(1, 5, CellValue::Date(date), Some(3))]);
        sheet.set(2, 5, CellValue::Date(date), None);
        sheet.set(2, 0, CellValue::from("Dec"), Some(7));
        assert_eq!(sheet.cells[&(2, 5)].style, Some(3));
        assert_eq!(sheet.cells[&(2, 0)].style, Some(7));
        assert!(sheet.dirty);
    }

    #[test]
    fn clear_keeps_styled_cells() {
        let mut sheet = sheet_with(&[
            (0, 0, CellValue::from("Month"), None),
            (1, 0, CellValue::from("Dec"), Some(2)),
        ]);
        sheet.clear(0, 0);
        sheet.clear(1, 0);
        assert!(!sheet.cells.contains_key(&(0, 0)));
        assert_eq!(sheet.cells[&(1, 0)].value, CellValue::Empty);
        assert_eq!(sheet.get(1, 0), None);
        assert_eq!(sheet.bounds(), None);
    }

    #[test]
    fn text_rows_start_at_a1() {
        let sheet = sheet_with(&[
            (1, 1, CellValue::from("SRW"), None),
            (2, 0, CellValue::Number(5.0), None),
        ]);
        assert_eq!(sheet.bounds(), Some((1, 0, 2, 1)));
        assert_eq!(
            sheet.text_rows(),
            vec![
                vec![None, None],
                vec![None, Some("SRW".to_owned())],
                vec![Some("5".to_owned()), None],
            ]
        );
    }

    #[test]
    fn sheet_data_xml() -> Result<(), LedgerError> {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let sheet = sheet_with(&[
            (0, 0, CellValue::from("Month"), None),
            (1, 0, CellValue::Empty, Some(4)),
            (1, 1, CellValue::Date(date), Some(1)),
            (1, 2, CellValue::Number(-2.5), None),
        ]);
        let mut builder = XmlBuilder::fragment();
        sheet.write_sheet_data(&mut builder, false)?;
        let xml = String::from_utf8(builder.finish()).unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t xml:space="preserve">Month</t></is></c></row>"#,
                r#"<row r="2"><c r="A2" s="4"/><c r="B2" s="1"><v>45931</v></c><c r="C2"><v>-2.5</v></c></row></sheetData>"#,
            )
        );
        Ok(())
    }

    #[test]
    fn shared_formulas_keep_their_attributes() -> Result<(), LedgerError> {
        let shared = |text: &str, extra: &[(&str, &str)]| Formula {
            text: text.to_owned(),
            attributes: [("t", "shared"), ("si", "0")]
                .iter()
                .chain(extra)
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        };
        let mut sheet = Sheet::new("Calc");
        sheet.cells.insert((0, 1), StoredCell {
            value: CellValue::Number(2.0),
            style: None,
            formula: Some(shared("A1*2", &[("ref", "B1:B2")])),
        });
        sheet.cells.insert((1, 1), StoredCell {
            value: CellValue::Number(6.0),
            style: None,
            formula: Some(shared("", &[])),
        });
        let mut builder = XmlBuilder::fragment();
        sheet.write_sheet_data(&mut builder, false)?;
        let xml = String::from_utf8(builder.finish()).unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<sheetData><row r="1"><c r="B1"><f t="shared" si="0" ref="B1:B2">A1*2</f><v>2</v></c></row>"#,
                r#"<row r="2"><c r="B2"><f t="shared" si="0"></f><v>6</v></c></row></sheetData>"#,
            )
        );
        Ok(())
    }
}
