//! XML rendering for every part of the package.
//!
//! All markup goes through `quick_xml::Writer`, so text and attribute values are
//! escaped by the writer rather than by hand. Shared strings additionally get
//! `_xHHHH_` escapes for characters XML cannot carry.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::cell_ref::cell_address;
use crate::error::Result;
use crate::namespaces::{
    worksheet_path, worksheet_target, CT_RELATIONSHIPS, CT_SHARED_STRINGS, CT_STYLES, CT_WORKBOOK,
    CT_WORKSHEET, CT_XML, NS_CONTENT_TYPES, NS_OFFICE_RELATIONSHIPS, NS_RELATIONSHIPS,
    NS_SPREADSHEET, PATH_SHARED_STRINGS, PATH_STYLES, PATH_WORKBOOK, REL_SHARED_STRINGS,
    REL_STYLES, REL_WORKBOOK, REL_WORKSHEET,
};

use super::shared_strings::SharedStringTable;
use super::xstring;
use super::sheet::{CellValue, Worksheet};

type XmlWriter = Writer<Vec<u8>>;

fn new_writer() -> Result<XmlWriter> {
    let mut w = Writer::new(Vec::with_capacity(4096));
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(w)
}

fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    w.write_event(Event::Start(elem))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    w.write_event(Event::Empty(elem))?;
    Ok(())
}

fn text(w: &mut XmlWriter, value: &str) -> Result<()> {
    w.write_event(Event::Text(BytesText::new(value)))?;
    Ok(())
}

fn text_element(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], value: &str) -> Result<()> {
    start(w, name, attrs)?;
    text(w, value)?;
    end(w, name)
}

/// Relationship id of the `n`th relationship (1-based).
pub(crate) fn rel_id(n: usize) -> String {
    format!("rId{n}")
}

/// `[Content_Types].xml`: one override per part actually present.
pub(crate) fn write_content_types(sheet_count: usize) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(&mut w, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    empty(
        &mut w,
        "Default",
        &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)],
    )?;
    empty(&mut w, "Default", &[("Extension", "xml"), ("ContentType", CT_XML)])?;

    let workbook = format!("/{PATH_WORKBOOK}");
    empty(
        &mut w,
        "Override",
        &[("PartName", workbook.as_str()), ("ContentType", CT_WORKBOOK)],
    )?;
    for idx in 1..=sheet_count {
        let part = format!("/{}", worksheet_path(idx));
        empty(
            &mut w,
            "Override",
            &[("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)],
        )?;
    }
    let styles = format!("/{PATH_STYLES}");
    empty(
        &mut w,
        "Override",
        &[("PartName", styles.as_str()), ("ContentType", CT_STYLES)],
    )?;
    let sst = format!("/{PATH_SHARED_STRINGS}");
    empty(
        &mut w,
        "Override",
        &[("PartName", sst.as_str()), ("ContentType", CT_SHARED_STRINGS)],
    )?;
    end(&mut w, "Types")?;
    Ok(w.into_inner())
}

/// `_rels/.rels`: the package root points at the workbook.
pub(crate) fn write_root_rels() -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(&mut w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    empty(
        &mut w,
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_WORKBOOK), ("Target", PATH_WORKBOOK)],
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

/// `xl/workbook.xml`: sheets in tab order, sheet `n` bound to `rId<n>`.
pub(crate) fn write_workbook(sheet_names: &[&str]) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(
        &mut w,
        "workbook",
        &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;
    start(&mut w, "sheets", &[])?;
    for (idx, name) in sheet_names.iter().copied().enumerate() {
        let sheet_id = (idx + 1).to_string();
        let r_id = rel_id(idx + 1);
        empty(
            &mut w,
            "sheet",
            &[("name", name), ("sheetId", sheet_id.as_str()), ("r:id", r_id.as_str())],
        )?;
    }
    end(&mut w, "sheets")?;
    end(&mut w, "workbook")?;
    Ok(w.into_inner())
}

/// `xl/_rels/workbook.xml.rels`: worksheets first, then styles and shared strings.
pub(crate) fn write_workbook_rels(sheet_count: usize) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(&mut w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    for idx in 1..=sheet_count {
        let id = rel_id(idx);
        let target = worksheet_target(idx);
        empty(
            &mut w,
            "Relationship",
            &[("Id", id.as_str()), ("Type", REL_WORKSHEET), ("Target", target.as_str())],
        )?;
    }
    let styles_id = rel_id(sheet_count + 1);
    empty(
        &mut w,
        "Relationship",
        &[("Id", styles_id.as_str()), ("Type", REL_STYLES), ("Target", "styles.xml")],
    )?;
    let sst_id = rel_id(sheet_count + 2);
    empty(
        &mut w,
        "Relationship",
        &[
            ("Id", sst_id.as_str()),
            ("Type", REL_SHARED_STRINGS),
            ("Target", "sharedStrings.xml"),
        ],
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

/// `xl/styles.xml` with a single default font, border and cell format.
///
/// The second fill (`gray125`) is reserved by Excel and must always be present.
pub(crate) fn write_styles() -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(&mut w, "styleSheet", &[("xmlns", NS_SPREADSHEET)])?;

    start(&mut w, "fonts", &[("count", "1")])?;
    start(&mut w, "font", &[])?;
    empty(&mut w, "sz", &[("val", "11")])?;
    empty(&mut w, "name", &[("val", "Calibri")])?;
    empty(&mut w, "family", &[("val", "2")])?;
    end(&mut w, "font")?;
    end(&mut w, "fonts")?;

    start(&mut w, "fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        start(&mut w, "fill", &[])?;
        empty(&mut w, "patternFill", &[("patternType", pattern)])?;
        end(&mut w, "fill")?;
    }
    end(&mut w, "fills")?;

    start(&mut w, "borders", &[("count", "1")])?;
    start(&mut w, "border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        empty(&mut w, side, &[])?;
    }
    end(&mut w, "border")?;
    end(&mut w, "borders")?;

    let xf = [
        ("numFmtId", "0"),
        ("fontId", "0"),
        ("fillId", "0"),
        ("borderId", "0"),
    ];
    start(&mut w, "cellStyleXfs", &[("count", "1")])?;
    empty(&mut w, "xf", &xf)?;
    end(&mut w, "cellStyleXfs")?;

    start(&mut w, "cellXfs", &[("count", "1")])?;
    let mut cell_xf = xf.to_vec();
    cell_xf.push(("xfId", "0"));
    empty(&mut w, "xf", &cell_xf)?;
    end(&mut w, "cellXfs")?;

    start(&mut w, "cellStyles", &[("count", "1")])?;
    empty(
        &mut w,
        "cellStyle",
        &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")],
    )?;
    end(&mut w, "cellStyles")?;

    end(&mut w, "styleSheet")?;
    Ok(w.into_inner())
}

/// `xl/sharedStrings.xml`. `count` and `uniqueCount` both equal the table size.
pub(crate) fn write_shared_strings(table: &SharedStringTable) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let count = table.len().to_string();
    start(
        &mut w,
        "sst",
        &[
            ("xmlns", NS_SPREADSHEET),
            ("count", count.as_str()),
            ("uniqueCount", count.as_str()),
        ],
    )?;
    for value in table.iter() {
        start(&mut w, "si", &[])?;
        let encoded = xstring::encode(value);
        if needs_space_preserve(value) {
            text_element(&mut w, "t", &[("xml:space", "preserve")], &encoded)?;
        } else {
            text_element(&mut w, "t", &[], &encoded)?;
        }
        end(&mut w, "si")?;
    }
    end(&mut w, "sst")?;
    Ok(w.into_inner())
}

fn needs_space_preserve(value: &str) -> bool {
    value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace)
}

/// Complete worksheet XML: dimension, column widths, then `<sheetData>`.
pub(crate) fn write_worksheet(sheet: &Worksheet) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    start(
        &mut w,
        "worksheet",
        &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;

    let dimension = sheet.dimension();
    empty(&mut w, "dimension", &[("ref", dimension.as_str())])?;

    if !sheet.col_widths.is_empty() {
        start(&mut w, "cols", &[])?;
        for (col, width) in (1u32..).zip(sheet.col_widths.iter()) {
            let col = col.to_string();
            let width = format!("{width:.2}");
            empty(
                &mut w,
                "col",
                &[
                    ("min", col.as_str()),
                    ("max", col.as_str()),
                    ("width", width.as_str()),
                    ("customWidth", "1"),
                ],
            )?;
        }
        end(&mut w, "cols")?;
    }

    start(&mut w, "sheetData", &[])?;
    for (row_num, row) in sheet.numbered_rows() {
        let r = row_num.to_string();
        if row.is_blank() {
            empty(&mut w, "row", &[("r", r.as_str())])?;
            continue;
        }
        start(&mut w, "row", &[("r", r.as_str())])?;
        for (col, cell) in (0u32..).zip(row.cells.iter()) {
            write_cell(&mut w, &cell_address(col, row_num), cell)?;
        }
        end(&mut w, "row")?;
    }
    end(&mut w, "sheetData")?;

    end(&mut w, "worksheet")?;
    Ok(w.into_inner())
}

/// Write a single `<c>` element.
fn write_cell(w: &mut XmlWriter, addr: &str, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Number(n) => {
            start(w, "c", &[("r", addr)])?;
            text_element(w, "v", &[], &n.normalize().to_string())?;
        }
        CellValue::SharedString(idx) => {
            start(w, "c", &[("r", addr), ("t", "s")])?;
            text_element(w, "v", &[], &idx.to_string())?;
        }
    }
    end(w, "c")
}
