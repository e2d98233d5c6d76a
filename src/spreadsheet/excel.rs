//! Office Open XML package helpers: relationships and number formats
use crate::error::LedgerError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::Package;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use quick_xml::events::Event;
use std::collections::HashMap;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

pub(crate) const REL_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_TABLE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";

/// A relationship entry with its target resolved to a package path
#[derive(Clone, Debug)]
pub(crate) struct Relationship {
    pub(crate) kind: String,
    pub(crate) target: String,
}

/// Loads the relationships of a part, keyed by relationship id.
/// A missing relationships part yields an empty map.
///
/// # Arguments
/// * `package` - Workbook package
/// * `part` - Path of the part owning the relationships, e.g. `xl/workbook.xml`
pub(crate) fn load_relationships(package: &Package, part: &str) -> Result<HashMap<String, Relationship>, LedgerError> {
    let path = relationships_path(part);
    let mut relationships: HashMap<String, Relationship> = HashMap::new();
    let Some(mut reader) = package.xml_reader(&path) else {
        return Ok(relationships);
    };
    let base = parent_dir(part);
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            let external = event.get_attribute_value("TargetMode")?
                .map(|mode| mode == "External")
                .unwrap_or(false);
            if let Some((id, target)) = id.zip(target).filter(|_| !external) {
                relationships.insert(id.to_string(), Relationship {
                    kind: kind.map(|kind| kind.to_string()).unwrap_or_default(),
                    target: resolve_target(base, &target),
                });
            }
        }
    });
    Ok(relationships)
}

/// Maps format indexes to cell types using custom and built-in formats
pub(crate) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Path of the relationships part belonging to `part`
/// (`xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`).
pub(crate) fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolves a relationship target against the directory of its source part.
/// Absolute targets start at the package root; `..` segments are collapsed.
pub(crate) fn resolve_target(base: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        base.split('/').filter(|segment| !segment.is_empty()).collect()
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_paths() {
        assert_eq!(relationships_path("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(relationships_path("xl/worksheets/sheet3.xml"), "xl/worksheets/_rels/sheet3.xml.rels");
    }

    #[test]
    fn targets_resolve_against_source_directory() {
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl", "/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl/worksheets", "../tables/table1.xml"), "xl/tables/table1.xml");
    }
}
