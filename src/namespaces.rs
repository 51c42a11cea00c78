//! XML namespaces, relationship types, content types and part paths for the
//! generated XLSX package.
//!
//! Consumers locate parts by path, so the paths below are fixed.

use quick_xml::events::BytesStart;

// =============================================================================
// Spreadsheet namespaces
// =============================================================================

/// Main spreadsheet namespace (Transitional conformance)
pub const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Namespace for `r:id` attributes inside the workbook
pub const NS_OFFICE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// =============================================================================
// Package namespaces
// =============================================================================

/// Relationships namespace
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Content types namespace
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

// =============================================================================
// Relationship types
// =============================================================================

/// Relationship type for workbook (from root .rels)
pub const REL_WORKBOOK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type for worksheets
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Relationship type for styles
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Relationship type for shared strings
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

// =============================================================================
// Content types
// =============================================================================

pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";
pub const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

// =============================================================================
// Part paths
// =============================================================================

pub const PATH_CONTENT_TYPES: &str = "[Content_Types].xml";
pub const PATH_ROOT_RELS: &str = "_rels/.rels";
pub const PATH_WORKBOOK: &str = "xl/workbook.xml";
pub const PATH_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
pub const PATH_STYLES: &str = "xl/styles.xml";
pub const PATH_SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// Path of the 1-based `index`th worksheet, e.g. `xl/worksheets/sheet1.xml`.
pub fn worksheet_path(index: usize) -> String {
    format!("xl/worksheets/sheet{index}.xml")
}

/// Worksheet target as written in the workbook relationships (relative to `xl/`).
pub fn worksheet_target(index: usize) -> String {
    format!("worksheets/sheet{index}.xml")
}

/// Resolve a relationship target from `xl/_rels/workbook.xml.rels` to a package path.
pub fn resolve_workbook_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/{target}")
    }
}

// =============================================================================
// Helper functions for namespace-aware parsing
// =============================================================================

/// Check if an element matches a local name, ignoring namespace prefix.
#[inline]
pub fn element_matches(e: &BytesStart, local_name: &[u8]) -> bool {
    e.local_name().as_ref() == local_name
}

/// Get an attribute value by local name, so `r:id` and `id` both match `b"id"`.
pub fn attr_local(e: &BytesStart, local_name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
