//! In-memory worksheet: rows of cells addressed by position.
//!
//! Row numbers are implied by position (first row is 1) so they are always
//! contiguous and increasing. Column letters are implied by cell position
//! within the row.

use rust_decimal::Decimal;

use crate::cell_ref::range_from_a1;

/// Value of a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Written inline as `<v>`.
    Number(Decimal),
    /// Index into the package's shared string table.
    SharedString(usize),
}

impl CellValue {
    pub fn count(n: usize) -> Self {
        Self::Number(Decimal::from(n))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn is_blank(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    pub rows: Vec<Row>,
    /// Column widths in character units, starting at column A.
    pub col_widths: Vec<f64>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            col_widths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_col_widths(mut self, widths: &[f64]) -> Self {
        self.col_widths = widths.to_vec();
        self
    }

    /// Append a row and return its 1-based row number.
    pub fn push_row(&mut self, cells: Vec<CellValue>) -> u32 {
        self.rows.push(Row { cells });
        self.last_row()
    }

    /// Append an empty spacer row. It still counts towards the dimension.
    pub fn push_blank_row(&mut self) -> u32 {
        self.push_row(Vec::new())
    }

    /// 1-based number of the last row, 0 when the sheet is empty.
    pub fn last_row(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// 0-based index of the right-most column holding a cell.
    pub fn last_col(&self) -> Option<u32> {
        self.rows
            .iter()
            .map(|row| row.cells.len())
            .max()
            .and_then(|n| n.checked_sub(1))
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    }

    /// Declared `<dimension ref>` covering every emitted row and cell.
    pub fn dimension(&self) -> String {
        range_from_a1(self.last_col().unwrap_or(0), self.last_row())
    }

    /// Rows numbered from 1.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        (1u32..).zip(self.rows.iter())
    }
}
