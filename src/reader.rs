//! Read a generated `.xlsx` back into a plain summary.
//!
//! This is not a general XLSX parser. It reads exactly the parts this crate
//! writes (content types, workbook, workbook relationships, shared strings and
//! worksheets) and is used to verify a package before it is persisted.

use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref};
use crate::error::{ExportError, Result};
use crate::package::xstring;
use crate::namespaces::{
    attr_local, element_matches, resolve_workbook_target, CT_SHARED_STRINGS, CT_STYLES,
    CT_WORKBOOK, CT_WORKSHEET, PATH_CONTENT_TYPES, PATH_SHARED_STRINGS, PATH_STYLES,
    PATH_WORKBOOK, PATH_WORKBOOK_RELS, REL_SHARED_STRINGS, REL_STYLES, REL_WORKSHEET,
};

/// A cell read back from a worksheet, with shared strings resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadCell {
    /// 0-based column.
    pub col: u32,
    pub value: ReadValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadValue {
    Number(String),
    /// Text with the shared string index it came from.
    Text { index: usize, text: String },
}

impl ReadValue {
    pub fn as_text(&self) -> &str {
        match self {
            Self::Number(n) => n,
            Self::Text { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadRow {
    /// 1-based row number from the `r` attribute.
    pub number: u32,
    pub cells: Vec<ReadCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub path: String,
    pub dimension: Option<String>,
    pub rows: Vec<ReadRow>,
}

impl SheetSummary {
    /// Text of the cell at 1-based `row`, 0-based `col`.
    pub fn cell_text(&self, row: u32, col: u32) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.number == row)?
            .cells
            .iter()
            .find(|c| c.col == col)
            .map(|c| c.value.as_text())
    }

    /// All cell texts of a row, in column order.
    pub fn row_texts(&self, row: u32) -> Vec<&str> {
        self.rows
            .iter()
            .find(|r| r.number == row)
            .map(|r| r.cells.iter().map(|c| c.value.as_text()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSummary {
    pub sheets: Vec<SheetSummary>,
    pub shared_strings: Vec<String>,
    /// `count` declared on `<sst>`.
    pub declared_count: Option<usize>,
    /// `uniqueCount` declared on `<sst>`.
    pub declared_unique_count: Option<usize>,
    /// Part name (without leading `/`) -> content type override.
    pub content_type_overrides: HashMap<String, String>,
    /// Relationship id -> (type, resolved path) from the workbook relationships.
    pub workbook_rels: HashMap<String, (String, String)>,
    /// `r:id` of each workbook sheet, in workbook order.
    pub sheet_rel_ids: Vec<String>,
}

impl PackageSummary {
    pub fn sheet(&self, name: &str) -> Option<&SheetSummary> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Read a package from `.xlsx` bytes.
///
/// # Errors
/// Returns an error if the archive or a required part cannot be read.
pub fn read_package(data: &[u8]) -> Result<PackageSummary> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let content_type_overrides = parse_content_types(&mut archive)?;
    let workbook_rels = parse_workbook_relationships(&mut archive)?;
    let sheet_entries = parse_workbook_sheets(&mut archive)?;
    let (shared_strings, declared_count, declared_unique_count) =
        parse_shared_strings(&mut archive, &workbook_rels)?;

    let mut sheets = Vec::with_capacity(sheet_entries.len());
    let mut sheet_rel_ids = Vec::with_capacity(sheet_entries.len());
    for (name, r_id) in sheet_entries {
        let path = workbook_rels
            .get(&r_id)
            .map(|(_, path)| path.clone())
            .ok_or_else(|| {
                ExportError::Parse(format!("sheet '{name}' has no relationship {r_id}"))
            })?;
        let (dimension, rows) = parse_worksheet(&mut archive, &path, &shared_strings)?;
        sheets.push(SheetSummary {
            name,
            path,
            dimension,
            rows,
        });
        sheet_rel_ids.push(r_id);
    }

    Ok(PackageSummary {
        sheets,
        shared_strings,
        declared_count,
        declared_unique_count,
        content_type_overrides,
        workbook_rels,
        sheet_rel_ids,
    })
}

/// Read `data` and check the package contract.
///
/// # Errors
/// Returns [`ExportError::Build`] describing the first violated rule, or a
/// read error if the package cannot be parsed at all.
pub fn verify(data: &[u8]) -> Result<PackageSummary> {
    let summary = read_package(data)?;
    check_summary(&summary)?;
    tracing::debug!(sheets = summary.sheets.len(), "package verified");
    Ok(summary)
}

fn check_summary(summary: &PackageSummary) -> Result<()> {
    let fail = |msg: String| Err(ExportError::Build(msg));

    let expect_override = |part: &str, content_type: &str| -> Result<()> {
        match summary.content_type_overrides.get(part) {
            Some(ct) if ct == content_type => Ok(()),
            _ => Err(ExportError::Build(format!(
                "no content type override for {part}"
            ))),
        }
    };
    expect_override(PATH_WORKBOOK, CT_WORKBOOK)?;
    expect_override(PATH_STYLES, CT_STYLES)?;
    expect_override(PATH_SHARED_STRINGS, CT_SHARED_STRINGS)?;

    for (r_id, sheet) in summary.sheet_rel_ids.iter().zip(&summary.sheets) {
        match summary.workbook_rels.get(r_id) {
            Some((rel_type, _)) if rel_type == REL_WORKSHEET => {}
            _ => return fail(format!("sheet '{}' lacks a worksheet relationship", sheet.name)),
        }
        expect_override(&sheet.path, CT_WORKSHEET)?;
    }

    let has_rel = |rel: &str| summary.workbook_rels.values().any(|(t, _)| t == rel);
    if !has_rel(REL_STYLES) || !has_rel(REL_SHARED_STRINGS) {
        return fail("workbook relationships miss styles or shared strings".into());
    }

    let table_size = summary.shared_strings.len();
    for declared in [summary.declared_count, summary.declared_unique_count] {
        if declared.unwrap_or(0) != table_size {
            return fail(format!(
                "shared strings declare {declared:?}, table has {table_size}"
            ));
        }
    }
    let mut unique: Vec<&String> = summary.shared_strings.iter().collect();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != table_size {
        return fail("shared string table contains duplicates".into());
    }

    for sheet in &summary.sheets {
        check_sheet_dimension(sheet)?;
    }
    Ok(())
}

fn check_sheet_dimension(sheet: &SheetSummary) -> Result<()> {
    let Some((start_row, start_col, end_row, end_col)) =
        sheet.dimension.as_deref().and_then(parse_cell_range)
    else {
        return Err(ExportError::Build(format!(
            "sheet '{}' has no valid dimension",
            sheet.name
        )));
    };

    for (expected, row) in (1u32..).zip(&sheet.rows) {
        if row.number != expected {
            return Err(ExportError::Build(format!(
                "sheet '{}' row {} follows row {}",
                sheet.name,
                row.number,
                expected - 1
            )));
        }
    }

    let last_row = sheet.rows.last().map_or(0, |r| r.number);
    let last_col = sheet
        .rows
        .iter()
        .flat_map(|r| r.cells.iter().map(|c| c.col))
        .max()
        .unwrap_or(0);
    if start_row != 0 || start_col != 0 || end_row + 1 != last_row || end_col != last_col {
        return Err(ExportError::Build(format!(
            "sheet '{}' declares {:?}, content ends at row {last_row} col {last_col}",
            sheet.name, sheet.dimension
        )));
    }
    Ok(())
}

fn xml_reader<R: Read>(part: R) -> Reader<BufReader<R>> {
    let mut xml = Reader::from_reader(BufReader::new(part));
    xml.trim_text(true);
    xml
}

/// Map of part name -> content type from `[Content_Types].xml` overrides.
fn parse_content_types<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<HashMap<String, String>> {
    let file = archive.by_name(PATH_CONTENT_TYPES)?;
    let mut xml = xml_reader(file);
    let mut overrides = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if element_matches(e, b"Override") => {
                if let (Some(part), Some(ct)) =
                    (attr_local(e, b"PartName"), attr_local(e, b"ContentType"))
                {
                    let part = part.strip_prefix('/').unwrap_or(&part).to_string();
                    overrides.insert(part, ct);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(overrides)
}

/// Relationship id -> (type, resolved path) from `xl/_rels/workbook.xml.rels`.
fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<HashMap<String, (String, String)>> {
    let file = archive.by_name(PATH_WORKBOOK_RELS)?;
    let mut xml = xml_reader(file);
    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if element_matches(e, b"Relationship") => {
                if let (Some(id), Some(rel_type), Some(target)) = (
                    attr_local(e, b"Id"),
                    attr_local(e, b"Type"),
                    attr_local(e, b"Target"),
                ) {
                    rels.insert(id, (rel_type, resolve_workbook_target(&target)));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Sheet names and relationship ids from `xl/workbook.xml`, in tab order.
fn parse_workbook_sheets<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Vec<(String, String)>> {
    let file = archive.by_name(PATH_WORKBOOK)?;
    let mut xml = xml_reader(file);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if element_matches(e, b"sheet") => {
                let name = attr_local(e, b"name").unwrap_or_default();
                let r_id = attr_local(e, b"id").unwrap_or_default();
                sheets.push((name, r_id));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

type SharedStrings = (Vec<String>, Option<usize>, Option<usize>);

/// Shared strings plus the declared `count` and `uniqueCount`.
fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels: &HashMap<String, (String, String)>,
) -> Result<SharedStrings> {
    let path = rels
        .values()
        .find(|(t, _)| t == REL_SHARED_STRINGS)
        .map_or(PATH_SHARED_STRINGS, |(_, p)| p.as_str());
    let Ok(file) = archive.by_name(path) else {
        return Ok((Vec::new(), None, None));
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut count = None;
    let mut unique_count = None;
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"sst" => {
                    count = attr_local(e, b"count").and_then(|v| v.parse().ok());
                    unique_count = attr_local(e, b"uniqueCount").and_then(|v| v.parse().ok());
                }
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Event::Empty(ref e) if element_matches(e, b"sst") => {
                count = attr_local(e, b"count").and_then(|v| v.parse().ok());
                unique_count = attr_local(e, b"uniqueCount").and_then(|v| v.parse().ok());
            }
            Event::Text(ref e) if in_t => {
                let text = e.unescape()?;
                if text.chars().any(xstring::is_forbidden) {
                    return Err(ExportError::Parse(format!(
                        "{path}: shared string {} contains a character XML does not allow",
                        strings.len()
                    )));
                }
                current.push_str(&text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(xstring::decode(&current).into_owned());
                    current.clear();
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((strings, count, unique_count))
}

/// Dimension and rows of one worksheet.
fn parse_worksheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
) -> Result<(Option<String>, Vec<ReadRow>)> {
    let file = archive.by_name(path)?;
    let mut xml = xml_reader(file);

    let mut dimension = None;
    let mut rows: Vec<ReadRow> = Vec::new();
    let mut cell: Option<(u32, bool)> = None;
    let mut in_v = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if element_matches(e, b"dimension") => {
                dimension = attr_local(e, b"ref");
            }
            Event::Empty(ref e) | Event::Start(ref e) if element_matches(e, b"row") => {
                let number = attr_local(e, b"r")
                    .and_then(|r| r.parse().ok())
                    .ok_or_else(|| ExportError::Parse(format!("{path}: row without number")))?;
                rows.push(ReadRow {
                    number,
                    cells: Vec::new(),
                });
            }
            Event::Start(ref e) if element_matches(e, b"c") => {
                let addr = attr_local(e, b"r").unwrap_or_default();
                let (col, _) = parse_cell_ref(&addr)
                    .ok_or_else(|| ExportError::Parse(format!("{path}: bad cell ref '{addr}'")))?;
                let is_shared = attr_local(e, b"t").as_deref() == Some("s");
                cell = Some((col, is_shared));
            }
            Event::Start(ref e) if element_matches(e, b"v") => in_v = true,
            Event::Text(ref e) if in_v => {
                let raw = e.unescape()?;
                let (Some((col, is_shared)), Some(row)) = (cell, rows.last_mut()) else {
                    return Err(ExportError::Parse(format!("{path}: value outside a cell")));
                };
                let value = if is_shared {
                    let index: usize = raw.parse().map_err(|_| {
                        ExportError::Parse(format!("{path}: bad shared string index '{raw}'"))
                    })?;
                    let text = shared_strings.get(index).cloned().ok_or_else(|| {
                        ExportError::Build(format!(
                            "{path}: shared string index {index} out of range"
                        ))
                    })?;
                    ReadValue::Text { index, text }
                } else {
                    ReadValue::Number(raw.into_owned())
                };
                row.cells.push(ReadCell { col, value });
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"c" => cell = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((dimension, rows))
}
