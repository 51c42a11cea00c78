//! Shared string table: each distinct text value stored once, referenced by index.
//!
//! A table is owned by one package build. Indices are assigned in insertion
//! order and never change once handed out.

use indexmap::IndexSet;

#[derive(Debug, Clone, Default)]
pub struct SharedStringTable {
    strings: IndexSet<String>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, inserting it at the end if not yet present.
    pub fn intern(&mut self, value: &str) -> usize {
        if let Some(idx) = self.strings.get_index_of(value) {
            return idx;
        }
        self.strings.insert_full(value.to_string()).0
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.strings.get_index_of(value)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.strings.get_index(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}
