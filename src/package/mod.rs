//! XLSX package assembly.
//!
//! [`build`] turns aggregated transactions into a [`PackageParts`]: the
//! worksheet model, the shared string table and the rendered XML of every part,
//! keyed by the path it occupies inside the archive.

pub mod builder;
pub mod shared_strings;
pub mod sheet;
pub(crate) mod xml;
pub(crate) mod xstring;

pub use builder::{build, SUMMARY_SHEET, TRANSACTIONS_SHEET};
pub use shared_strings::SharedStringTable;
pub use sheet::{CellValue, Row, Worksheet};

use std::collections::HashSet;

use crate::error::{ExportError, Result};
use crate::namespaces::{
    worksheet_path, PATH_CONTENT_TYPES, PATH_ROOT_RELS, PATH_SHARED_STRINGS, PATH_STYLES,
    PATH_WORKBOOK, PATH_WORKBOOK_RELS,
};

/// One named entry of the package.
#[derive(Debug, Clone)]
pub struct Part {
    pub path: String,
    pub data: Vec<u8>,
}

impl Part {
    fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

/// Everything needed to write one `.xlsx` file.
#[derive(Debug, Clone)]
pub struct PackageParts {
    pub sheets: Vec<Worksheet>,
    pub shared_strings: SharedStringTable,
    /// Rendered parts in archive order.
    pub parts: Vec<Part>,
}

impl PackageParts {
    /// Render every part from the worksheet model and string table.
    ///
    /// # Errors
    /// Returns an error if XML writing fails or the result fails [`PackageParts::check`].
    pub fn render(sheets: Vec<Worksheet>, shared_strings: SharedStringTable) -> Result<Self> {
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();

        let mut parts = vec![
            Part::new(PATH_CONTENT_TYPES, xml::write_content_types(sheets.len())?),
            Part::new(PATH_ROOT_RELS, xml::write_root_rels()?),
            Part::new(PATH_WORKBOOK, xml::write_workbook(&names)?),
            Part::new(PATH_WORKBOOK_RELS, xml::write_workbook_rels(sheets.len())?),
            Part::new(PATH_STYLES, xml::write_styles()?),
            Part::new(PATH_SHARED_STRINGS, xml::write_shared_strings(&shared_strings)?),
        ];
        for (idx, sheet) in sheets.iter().enumerate() {
            parts.push(Part::new(worksheet_path(idx + 1), xml::write_worksheet(sheet)?));
        }

        let package = Self {
            sheets,
            shared_strings,
            parts,
        };
        package.check()?;
        Ok(package)
    }

    pub fn part(&self, path: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.path == path)
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Structural contract: every required part exists exactly once, every
    /// sheet has its worksheet part, and every string cell points into the table.
    ///
    /// # Errors
    /// Returns [`ExportError::Build`] describing the first violation.
    pub fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for part in &self.parts {
            if !seen.insert(part.path.as_str()) {
                return Err(ExportError::Build(format!("duplicate part {}", part.path)));
            }
        }

        let fixed = [
            PATH_CONTENT_TYPES,
            PATH_ROOT_RELS,
            PATH_WORKBOOK,
            PATH_WORKBOOK_RELS,
            PATH_STYLES,
            PATH_SHARED_STRINGS,
        ];
        let sheet_paths: Vec<String> = (1..=self.sheets.len()).map(worksheet_path).collect();
        for path in fixed.iter().copied().chain(sheet_paths.iter().map(String::as_str)) {
            if !seen.contains(path) {
                return Err(ExportError::Build(format!("missing part {path}")));
            }
        }
        if seen.len() != fixed.len() + sheet_paths.len() {
            return Err(ExportError::Build("unexpected extra parts".into()));
        }

        for sheet in &self.sheets {
            let cells = sheet.rows.iter().flat_map(|r| r.cells.iter());
            for cell in cells {
                if let CellValue::SharedString(idx) = cell {
                    if self.shared_strings.get(*idx).is_none() {
                        return Err(ExportError::Build(format!(
                            "sheet '{}' references shared string {idx} of {}",
                            sheet.name,
                            self.shared_strings.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Total bytes of uncompressed XML.
    pub fn xml_size(&self) -> usize {
        self.parts.iter().map(|p| p.data.len()).sum()
    }
}
