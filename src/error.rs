//! Structured error types for statement export.
//!
//! Every stage of the pipeline (aggregate, build, serialize, persist, deliver)
//! reports through [`ExportError`]. A cancelled save/share dialog is not an
//! error; see [`crate::delivery::DeliveryOutcome::Cancelled`].

use std::path::PathBuf;

/// All errors that can occur while exporting a statement.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No transactions were supplied for the statement.
    #[error("No transactions to export")]
    EmptyInput,

    /// Intermediate package state is malformed.
    #[error("Package build failed: {0}")]
    Build(String),

    /// XML writing or reading error from quick-xml.
    #[error("XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing the finished archive to disk failed.
    #[error("Could not write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside the persist step.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input or configuration could not be decoded.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A package could not be read back.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Neither a native save nor a share mechanism is available.
    #[error("No save or share mechanism is available")]
    DeliveryUnavailable,

    /// A delivery mechanism was available but failed.
    #[error("Delivery via {channel} failed: {reason}")]
    Delivery {
        channel: &'static str,
        reason: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Build a persist error for `path`.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// True when the export was rejected because there was nothing to export.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }

    /// True for archive construction failures (XML or ZIP).
    pub fn is_serialize(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Zip(_))
    }

    /// True for errors raised by the delivery layer.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::DeliveryUnavailable | Self::Delivery { .. })
    }
}
