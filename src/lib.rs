//! statement-xlsx - export financial statements as XLSX workbooks
//!
//! Turns a list of transactions into an Office Open XML spreadsheet with two
//! sheets:
//! - Summary: totals and one row per category
//! - Transactions: every transaction, newest first
//!
//! The package (shared strings, worksheets, styles, manifests) is assembled
//! directly with `quick-xml` and packed with `zip`; no spreadsheet library
//! is involved.
//!
//! # Usage
//!
//! ```no_run
//! use statement_xlsx::{ExportConfig, StatementExporter, Transaction};
//!
//! # fn run(transactions: Vec<Transaction>) -> statement_xlsx::error::Result<()> {
//! let exporter = StatementExporter::new(ExportConfig::default())?;
//! let outcome = exporter.export("January", &transactions)?;
//! println!("wrote {}", outcome.file.path.display());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cell_ref;
pub mod config;
pub mod delivery;
pub mod error;
pub mod exporter;
pub mod model;
pub mod namespaces;
pub mod package;
pub mod persist;
pub mod reader;
pub mod serialize;

pub use aggregate::{aggregate, Aggregate, CategoryGroup};
pub use config::ExportConfig;
pub use delivery::{Delivery, DeliveryChain, DeliveryOutcome, FolderPicker, SaveToFolder, SystemShare};
pub use error::ExportError;
pub use exporter::{export_statement, DeliveryStatus, ExportOutcome, StatementExporter};
pub use model::{Category, Transaction, TransactionKind};
pub use package::{build, PackageParts};
pub use persist::ExportedFile;

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
