use crate::error::LedgerError;
use crate::error::ResultMessage;
use crate::helpers::xml::raw_reader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlBuilder;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::Package;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::REL_TABLE;
use crate::spreadsheet::excel::REL_WORKSHEET;
use crate::spreadsheet::range::TableRange;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Formula;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::sheet::StoredCell;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

// XML tag names for parsing the xlsx format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_SHEET_DATA: QName = QName(b"sheetData");    // Cell container in worksheet
const TAG_DIMENSION: QName = QName(b"dimension");     // Used range of a worksheet
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_FORMULA: QName = QName(b"f");               // Cell formula
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_TABLE: QName = QName(b"table");             // Table part root
const TAG_AUTO_FILTER: QName = QName(b"autoFilter");  // Table filter range

/// A table part attached to a worksheet
#[derive(Clone, Debug)]
pub(crate) struct TablePart {
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) path: String,
    pub(crate) range: TableRange,
    pub(crate) dirty: bool,
}

impl TablePart {
    /// Matches either the internal name or the display name, ignoring case
    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.display_name.eq_ignore_ascii_case(name)
    }
}

/// A worksheet together with its package path and tables
pub(crate) struct WorksheetPart {
    pub(crate) path: String,
    pub(crate) sheet: Sheet,
    pub(crate) tables: Vec<TablePart>,
}

/// An xlsx workbook loaded fully into memory
pub struct XlsxWorkbook {
    /// File the workbook was loaded from and is saved to
    path: PathBuf,
    /// Every part of the package, rewritten parts replaced on save
    package: Package,
    /// Whether the workbook uses the 1904 date system
    pub(crate) is_1904: bool,
    /// First cell format with a date number format, used for date cells without a style
    pub(crate) date_style: Option<usize>,
    /// Worksheets in workbook order
    pub(crate) worksheets: Vec<WorksheetPart>,
}

impl XlsxWorkbook {
    /// Opens an xlsx workbook and reads every worksheet and table
    ///
    /// # Arguments
    /// * `path` - Path to the xlsx file
    ///
    /// # Returns
    /// The loaded workbook, or an error if the package or one of its parts is unreadable
    pub fn open(path: impl AsRef<Path>) -> Result<XlsxWorkbook, LedgerError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let package = Package::open(path).with_prefix(&display)?;
        let (sheets, is_1904) = load_workbook(&package).with_prefix(&display)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(display.to_owned()))?
        }
        let number_formats = load_number_formats(&package, is_1904)?;
        let date_style = number_formats
            .iter()
            .position(|kind| matches!(kind, CellType::NumberDate1900 | CellType::NumberDate1904));
        let shared_strings = load_shared_strings(&package)?;

        let mut worksheets = Vec::with_capacity(sheets.len());
        for (name, sheet_path) in sheets {
            let sheet = read_sheet(&package, &name, &sheet_path, &number_formats, &shared_strings)
                .with_prefix(&format!("{display} [{name}]"))?;
            let tables = load_tables(&package, &sheet_path)?;
            debug!(sheet = %name, cells = sheet.cells.len(), tables = tables.len(), "loaded worksheet");
            worksheets.push(WorksheetPart { path: sheet_path, sheet, tables });
        }

        Ok(XlsxWorkbook {
            path: path.to_path_buf(),
            package,
            is_1904,
            date_style,
            worksheets,
        })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|part| part.sheet.name()).collect()
    }

    /// Gets a sheet by name (case-insensitive)
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.worksheet(name).map(|part| &part.sheet)
    }

    /// Gets the first sheet of the workbook
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.worksheets.first().map(|part| &part.sheet)
    }

    pub(crate) fn worksheet(&self, name: &str) -> Option<&WorksheetPart> {
        self.worksheets
            .iter()
            .find(|part| part.sheet.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn worksheet_mut(&mut self, name: &str) -> Result<&mut WorksheetPart, SpreadsheetError> {
        self.worksheets
            .iter_mut()
            .find(|part| part.sheet.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_owned()))
    }

    /// Writes every modified worksheet and table part back into the package and saves it
    /// to the file it was opened from.
    pub(crate) fn save_package(&mut self) -> Result<(), LedgerError> {
        let mut patches: Vec<(String, Vec<u8>)> = Vec::new();
        for part in &self.worksheets {
            if part.sheet.dirty {
                let original = self.package.file(&part.path)
                    .ok_or_else(|| SpreadsheetError::FileError(part.path.to_owned()))?;
                patches.push((part.path.to_owned(), patch_sheet_xml(original, &part.sheet, self.is_1904)?));
            }
            for table in part.tables.iter().filter(|table| table.dirty) {
                let original = self.package.file(&table.path)
                    .ok_or_else(|| SpreadsheetError::FileError(table.path.to_owned()))?;
                patches.push((table.path.to_owned(), patch_table_xml(original, &table.range)?));
            }
        }
        if patches.is_empty() {
            debug!(path = %self.path.display(), "workbook unchanged; nothing to save");
            return Ok(());
        }

        for (path, data) in patches {
            self.package.insert(&path, data);
        }
        self.package.save(&self.path)?;
        for part in &mut self.worksheets {
            part.sheet.dirty = false;
            part.tables.iter_mut().for_each(|table| table.dirty = false);
        }
        Ok(())
    }

    /// Finds a table in a sheet by name
    pub(crate) fn table(&self, sheet: &str, table: &str) -> Option<&TablePart> {
        self.worksheet(sheet)?.tables.iter().find(|part| part.is_named(table))
    }

    pub(crate) fn table_mut(&mut self, sheet: &str, table: &str) -> Result<&mut TablePart, SpreadsheetError> {
        let part = self.worksheet_mut(sheet)?;
        part.tables
            .iter_mut()
            .find(|part| part.is_named(table))
            .ok_or_else(|| SpreadsheetError::TableNotFound {
                sheet: sheet.to_owned(),
                table: table.to_owned(),
            })
    }
}

/// Loads workbook structure and worksheet information
///
/// Parses the workbook.xml file to extract worksheet names and their corresponding
/// package paths, and determines the date system (1900 vs 1904) used in the file.
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system) where worksheets are (name, zip_path) pairs
fn load_workbook(package: &Package) -> Result<(Vec<(String, String)>, bool), LedgerError> {
    let relationships = load_relationships(package, "xl/workbook.xml")?;
    let mut reader = package.xml_reader("xl/workbook.xml")
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                match relationships.get(&*id) {
                    Some(relationship) if relationship.kind.is_empty() || relationship.kind == REL_WORKSHEET => {
                        sheets.push((name.to_string(), relationship.target.to_owned()));
                    }
                    // Chart sheets and dialog sheets carry no cells
                    _ => debug!(sheet = %name, "skipping non-worksheet sheet"),
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats and cell styles from styles.xml
///
/// Parses custom number formats and cell style indexes to determine
/// how numeric values should be interpreted (dates, times, plain numbers).
///
/// # Returns
/// Vector of CellType values indexed by style ID
fn load_number_formats(package: &Package, is_1904: bool) -> Result<Vec<CellType>, LedgerError> {
    let mut reader = match package.xml_reader("xl/styles.xml") {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or(Cow::Borrowed("0"));
            format_indexes.push(id.to_string());
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Loads the shared string table; a workbook without one yields an empty table
fn load_shared_strings(package: &Package) -> Result<Vec<String>, LedgerError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match package.xml_reader("xl/sharedStrings.xml") {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads one worksheet part into memory
fn read_sheet(
    package: &Package,
    name: &str,
    path: &str,
    number_formats: &[CellType],
    shared_strings: &[String],
) -> Result<Sheet, LedgerError> {
    let mut sheet = Sheet::new(name);
    let mut reader = package.xml_reader(path)
        .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;

    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut style = None::<usize>;
    let mut value = String::new();
    let mut formula = None::<Formula>;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                row_count = number.saturating_sub(1);
            }
            let attributes = element_attributes(&event, &["r", "spans"])?;
            if !attributes.is_empty() {
                sheet.row_attributes.insert(row_count, attributes);
            }
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            kind = CellType::from_type_attribute(event.get_attribute_value("t")?.as_deref());
            style = event.parse_attribute_value::<usize>("s")?;
            if let Some(index) = style {
                if kind == CellType::Number {
                    kind = number_formats.get(index).copied().unwrap_or(CellType::Number);
                }
            }
            value.clear();
            formula = None;
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::Start(event) if event.name() == TAG_FORMULA => {
            let attributes = element_attributes(&event, &[])?;
            let text = read_string_value(&mut reader, TAG_FORMULA, true)?;
            formula = Some(Formula { text, attributes });
        }
        Event::End(event) if event.name() == TAG_CELL => {
            let resolved = if value.is_empty() && kind != CellType::InlineString {
                CellValue::Empty
            } else if kind == CellType::SharedString {
                let index = value.trim().parse::<usize>()?;
                CellValue::Text(shared_strings.get(index).cloned().unwrap_or_default())
            } else {
                CellValue::decode(kind, std::mem::take(&mut value))
            };
            if !matches!(resolved, CellValue::Empty) || style.is_some() || formula.is_some() {
                sheet.cells.insert((row, col), StoredCell {
                    value: resolved,
                    style,
                    formula: formula.take(),
                });
            }
            value.clear();
        }
    });
    Ok(sheet)
}

/// Attributes of an element as owned pairs, leaving out the `skipped` keys
fn element_attributes(event: &BytesStart, skipped: &[&str]) -> Result<Vec<(String, String)>, LedgerError> {
    let mut attributes = Vec::new();
    for result in event.attributes() {
        let attribute = result?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
        if !skipped.contains(&key.as_str()) {
            attributes.push((key, attribute.get_value()?.to_string()));
        }
    }
    Ok(attributes)
}

/// Loads the table parts referenced by a worksheet
fn load_tables(package: &Package, sheet_path: &str) -> Result<Vec<TablePart>, LedgerError> {
    let relationships = load_relationships(package, sheet_path)?;
    let mut paths: Vec<&String> = relationships
        .values()
        .filter(|relationship| relationship.kind == REL_TABLE)
        .map(|relationship| &relationship.target)
        .collect();
    paths.sort();

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let mut reader = package.xml_reader(path)
            .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
        let mut name = String::new();
        let mut display_name = String::new();
        let mut range = None::<TableRange>;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_TABLE => {
                name = event.get_attribute_value("name")?.unwrap_or_default().to_string();
                display_name = event.get_attribute_value("displayName")?.unwrap_or_default().to_string();
                if let Some(reference) = event.get_attribute_value("ref")? {
                    range = Some(TableRange::try_from(&*reference)?);
                }
            }
        });
        let range = range.ok_or_else(|| SpreadsheetError::FileError(format!("{path}#ref")))?;
        if name.is_empty() {
            name = display_name.to_owned();
        }
        tables.push(TablePart {
            name,
            display_name,
            path: path.to_owned(),
            range,
            dirty: false,
        });
    }
    Ok(tables)
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text annotations
/// and properly handling both text nodes and CDATA sections.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
fn read_string_value(
    reader: &mut XmlReader<&[u8]>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, LedgerError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Rewrites a worksheet part: `<sheetData>` is regenerated from the in-memory sheet and
/// `<dimension>` is updated; every other element is copied as written.
pub(crate) fn patch_sheet_xml(xml: &[u8], sheet: &Sheet, is_1904: bool) -> Result<Vec<u8>, LedgerError> {
    let mut reader = raw_reader(xml);
    let mut builder = XmlBuilder::fragment();
    let mut buffer = Vec::new();
    let mut skip_depth = 0usize;
    let dimension = sheet
        .bounds()
        .map(|(r0, c0, r1, c1)| TableRange::new(c0 + 1, r0 + 1, c1 + 1, r1 + 1).to_string())
        .unwrap_or_else(|| "A1".to_owned());

    loop {
        let event = reader.read_event_into(&mut buffer)?;
        match event {
            Event::Eof => break,
            _ if skip_depth > 0 => match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                _ => (),
            },
            Event::Start(event) if event.name() == TAG_SHEET_DATA => {
                sheet.write_sheet_data(&mut builder, is_1904)?;
                skip_depth = 1;
            }
            Event::Empty(event) if event.name() == TAG_SHEET_DATA => {
                sheet.write_sheet_data(&mut builder, is_1904)?;
            }
            Event::Empty(event) if event.name() == TAG_DIMENSION => {
                builder.event(Event::Empty(with_attribute(&event, "ref", &dimension)?))?;
            }
            event => builder.event(event)?,
        }
        buffer.clear();
    }
    Ok(builder.finish())
}

/// Rewrites a table part with a new `ref` on the table and its auto filter.
pub(crate) fn patch_table_xml(xml: &[u8], range: &TableRange) -> Result<Vec<u8>, LedgerError> {
    let mut reader = raw_reader(xml);
    let mut builder = XmlBuilder::fragment();
    let mut buffer = Vec::new();
    let reference = range.to_string();

    loop {
        let event = reader.read_event_into(&mut buffer)?;
        match event {
            Event::Eof => break,
            Event::Start(event) if event.name() == TAG_TABLE || event.name() == TAG_AUTO_FILTER => {
                builder.event(Event::Start(with_attribute(&event, "ref", &reference)?))?;
            }
            Event::Empty(event) if event.name() == TAG_AUTO_FILTER => {
                builder.event(Event::Empty(with_attribute(&event, "ref", &reference)?))?;
            }
            event => builder.event(event)?,
        }
        buffer.clear();
    }
    Ok(builder.finish())
}

/// Copies an element, replacing (or adding) one attribute
fn with_attribute<'a>(event: &BytesStart<'_>, key: &str, value: &str) -> Result<BytesStart<'a>, LedgerError> {
    let name = String::from_utf8_lossy(event.name().as_ref()).to_string();
    let mut element = BytesStart::new(name);
    let mut replaced = false;
    for result in event.attributes() {
        let attribute = result?;
        if attribute.key.as_ref() == key.as_bytes() {
            element.push_attribute((key, value));
            replaced = true;
        } else {
            element.push_attribute(attribute);
        }
    }
    if !replaced {
        element.push_attribute((key, value));
    }
    Ok(element.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::store::TableStore;
    use crate::spreadsheet::WorkbookWriter;

    const SHARED_FORMULA_SHEET: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<dimension ref="A1:B2"/><sheetData>"#,
        r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><f t="shared" ref="B1:B2" si="0">A1*2</f><v>2</v></c></row>"#,
        r#"<row r="2"><c r="A2"><v>3</v></c><c r="B2"><f t="shared" si="0"/><v>6</v></c></row>"#,
        r#"</sheetData></worksheet>"#,
    );

    #[test]
    fn saving_keeps_shared_formulas() -> Result<(), LedgerError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("calc.xlsx");
        WorkbookWriter::new().add_sheet("Calc", vec![vec![1.0.into()]])?.save(&path)?;
        let mut package = Package::open(&path)?;
        package.insert("xl/worksheets/sheet1.xml", SHARED_FORMULA_SHEET.as_bytes().to_vec());
        package.save(&path)?;

        let mut workbook = XlsxWorkbook::open(&path)?;
        let dependent = workbook.sheet("Calc").and_then(|sheet| sheet.cells.get(&(1, 1)).cloned());
        assert_eq!(dependent.and_then(|cell| cell.formula).map(|formula| formula.attributes), Some(vec![
            ("t".to_owned(), "shared".to_owned()),
            ("si".to_owned(), "0".to_owned()),
        ]));

        workbook.set_cell("Calc", 3, 1, CellValue::Number(5.0))?;
        workbook.save()?;

        let saved = Package::open(&path)?;
        let xml = String::from_utf8_lossy(saved.file("xl/worksheets/sheet1.xml").unwrap_or_default()).to_string();
        assert!(xml.contains(r#"<f t="shared" ref="B1:B2" si="0">A1*2</f>"#), "{xml}");
        assert!(xml.contains(r#"<c r="B2"><f t="shared" si="0"></f><v>6</v></c>"#), "{xml}");
        assert_eq!(XlsxWorkbook::open(&path)?.cell("Calc", 3, 1)?, CellValue::Number(5.0));
        Ok(())
    }
}
