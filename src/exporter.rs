//! End-to-end statement export: aggregate, build, serialize, persist, deliver.
//!
//! Every call builds its own package; nothing is shared between exports, so a
//! [`StatementExporter`] can serve concurrent requests.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};

use crate::aggregate::aggregate;
use crate::config::ExportConfig;
use crate::delivery::{DeliveryChain, DeliveryOutcome};
use crate::error::{ExportError, Result};
use crate::model::Transaction;
use crate::package::build;
use crate::persist::{export_file_name, persist, ExportedFile};
use crate::reader::verify;
use crate::serialize::serialize;

/// What happened after the file was written.
#[derive(Debug)]
pub enum DeliveryStatus {
    /// No delivery chain was configured.
    NotRequested,
    /// Delivered, or cancelled by the user.
    Completed(DeliveryOutcome),
    /// The file exists but could not be saved or shared.
    Failed(ExportError),
}

/// A successful export. The file exists regardless of [`ExportOutcome::delivery`].
#[derive(Debug)]
pub struct ExportOutcome {
    pub file: ExportedFile,
    pub delivery: DeliveryStatus,
}

impl ExportOutcome {
    pub fn was_delivered(&self) -> bool {
        matches!(
            self.delivery,
            DeliveryStatus::Completed(DeliveryOutcome::Delivered { .. })
        )
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(
            self.delivery,
            DeliveryStatus::Completed(DeliveryOutcome::Cancelled { .. })
        )
    }
}

#[derive(Debug, Default)]
pub struct StatementExporter {
    config: ExportConfig,
    delivery: Option<DeliveryChain>,
}

impl StatementExporter {
    /// # Errors
    /// Returns [`ExportError::Config`] if `config` fails validation.
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            delivery: None,
        })
    }

    #[must_use]
    pub fn with_delivery(mut self, chain: DeliveryChain) -> Self {
        self.delivery = Some(chain);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir()
    }

    /// Aggregate, build and serialize without touching the filesystem.
    ///
    /// # Errors
    /// - [`ExportError::EmptyInput`] when `transactions` is empty.
    /// - Build, XML or ZIP errors from the package stages.
    pub fn to_bytes(&self, transactions: &[Transaction]) -> Result<Vec<u8>> {
        let grouped = aggregate(transactions)?;
        let package = build(transactions, &grouped, &self.config)?;
        let bytes = serialize(&package, self.config.compression_level)?;
        if self.config.verify_package {
            verify(&bytes)?;
        }
        Ok(bytes)
    }

    /// Export `transactions` as `Statement_<source_name>_<now>.xlsx`.
    ///
    /// # Errors
    /// See [`StatementExporter::export_at`].
    pub fn export(&self, source_name: &str, transactions: &[Transaction]) -> Result<ExportOutcome> {
        self.export_at(source_name, transactions, Utc::now())
    }

    /// Export with an explicit timestamp for the file name.
    ///
    /// Delivery problems do not fail the export: they are reported in
    /// [`ExportOutcome::delivery`].
    ///
    /// # Errors
    /// Any failure up to and including writing the file. No file is left
    /// behind in that case.
    pub fn export_at(
        &self,
        source_name: &str,
        transactions: &[Transaction],
        at: DateTime<Utc>,
    ) -> Result<ExportOutcome> {
        let _span = tracing::info_span!("export", source = source_name).entered();
        if transactions.is_empty() {
            tracing::warn!("no transactions to export");
            return Err(ExportError::EmptyInput);
        }

        let bytes = self.to_bytes(transactions)?;
        let file_name = export_file_name(source_name, at);
        let file = persist(&bytes, &self.output_dir(), &file_name)?;

        let delivery = match &self.delivery {
            None => DeliveryStatus::NotRequested,
            Some(chain) => match chain.deliver(&file) {
                Ok(outcome) => DeliveryStatus::Completed(outcome),
                Err(err) => {
                    tracing::warn!(error = %err, path = %file.path.display(), "export written but not delivered");
                    DeliveryStatus::Failed(err)
                }
            },
        };

        tracing::info!(
            transactions = transactions.len(),
            path = %file.path.display(),
            "statement exported"
        );
        Ok(ExportOutcome { file, delivery })
    }

    /// Run [`StatementExporter::export`] on a worker thread.
    pub fn spawn(
        self: Arc<Self>,
        source_name: String,
        transactions: Vec<Transaction>,
    ) -> JoinHandle<Result<ExportOutcome>> {
        std::thread::spawn(move || self.export(&source_name, &transactions))
    }
}

/// One-shot export with `config` and an optional delivery chain.
///
/// # Errors
/// See [`StatementExporter::export_at`].
pub fn export_statement(
    source_name: &str,
    transactions: &[Transaction],
    config: ExportConfig,
    delivery: Option<DeliveryChain>,
) -> Result<ExportOutcome> {
    let mut exporter = StatementExporter::new(config)?;
    if let Some(chain) = delivery {
        exporter = exporter.with_delivery(chain);
    }
    exporter.export(source_name, transactions)
}
