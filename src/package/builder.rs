//! Builds the Summary and Transactions sheets of a statement export.
//!
//! Strings are interned in the order cells are produced: the Summary sheet
//! top to bottom, then the Transactions sheet. The same input therefore
//! always yields the same shared string indices.

use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregate::Aggregate;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::model::Transaction;

use super::shared_strings::SharedStringTable;
use super::sheet::{CellValue, Worksheet};
use super::PackageParts;

pub const SUMMARY_SHEET: &str = "Summary";
pub const TRANSACTIONS_SHEET: &str = "Transactions";

const SUMMARY_TITLE: &str = "Statement Export Summary";
const SUMMARY_HEADERS: [&str; 3] = ["Category", "Transaction Count", "Total Amount"];
const TRANSACTION_HEADERS: [&str; 6] = [
    "Date",
    "Description",
    "Category",
    "Type",
    "Amount",
    "Currency",
];

const SUMMARY_WIDTHS: [f64; 3] = [28.0, 20.0, 16.0];
const TRANSACTION_WIDTHS: [f64; 6] = [14.0, 40.0, 22.0, 10.0, 14.0, 10.0];

/// Build the package for `transactions` grouped as `aggregate`.
///
/// # Errors
/// - [`ExportError::EmptyInput`] if `transactions` is empty.
/// - [`ExportError::Build`] if `aggregate` does not describe `transactions`
///   (an empty group, or a different transaction count).
/// - [`ExportError::Config`] if the configured date format cannot be rendered.
pub fn build(
    transactions: &[Transaction],
    aggregate: &Aggregate<'_>,
    config: &ExportConfig,
) -> Result<PackageParts> {
    if transactions.is_empty() {
        return Err(ExportError::EmptyInput);
    }
    if aggregate.transaction_count() != transactions.len() {
        return Err(ExportError::Build(format!(
            "aggregate covers {} transactions, input has {}",
            aggregate.transaction_count(),
            transactions.len()
        )));
    }

    let mut builder = SheetBuilder::default();
    let summary = builder.summary_sheet(transactions.len(), aggregate)?;
    let details = builder.transactions_sheet(transactions, config)?;

    tracing::debug!(
        summary_rows = summary.last_row(),
        transaction_rows = details.last_row(),
        shared_strings = builder.strings.len(),
        "built worksheets"
    );

    PackageParts::render(vec![summary, details], builder.strings)
}

/// Owns the string table for a single build.
#[derive(Default)]
struct SheetBuilder {
    strings: SharedStringTable,
}

impl SheetBuilder {
    fn text(&mut self, value: &str) -> CellValue {
        CellValue::SharedString(self.strings.intern(value))
    }

    fn texts(&mut self, values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| self.text(v)).collect()
    }

    fn summary_sheet(&mut self, total: usize, aggregate: &Aggregate<'_>) -> Result<Worksheet> {
        let mut sheet = Worksheet::new(SUMMARY_SHEET).with_col_widths(&SUMMARY_WIDTHS);

        let title = self.text(SUMMARY_TITLE);
        sheet.push_row(vec![title]);
        let label = self.text("Total Transactions");
        sheet.push_row(vec![label, CellValue::count(total)]);
        let label = self.text("Total Categories");
        sheet.push_row(vec![label, CellValue::count(aggregate.category_count())]);
        sheet.push_blank_row();
        let headers = self.texts(&SUMMARY_HEADERS);
        sheet.push_row(headers);

        for (key, group) in &aggregate.groups {
            if group.is_empty() {
                return Err(ExportError::Build(format!(
                    "category group '{key}' has no transactions"
                )));
            }
            let name = self.text(group.name);
            sheet.push_row(vec![
                name,
                CellValue::count(group.len()),
                CellValue::Number(round_cents(group.total)),
            ]);
        }
        Ok(sheet)
    }

    fn transactions_sheet(
        &mut self,
        transactions: &[Transaction],
        config: &ExportConfig,
    ) -> Result<Worksheet> {
        let mut sheet = Worksheet::new(TRANSACTIONS_SHEET).with_col_widths(&TRANSACTION_WIDTHS);
        let headers = self.texts(&TRANSACTION_HEADERS);
        sheet.push_row(headers);

        let mut sorted: Vec<&Transaction> = transactions.iter().collect();
        sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        let mut date = String::new();
        for txn in sorted {
            date.clear();
            let local = config.local_time(txn.occurred_at)?;
            write!(date, "{}", local.format(&config.date_format)).map_err(|_| {
                ExportError::Config(format!("invalid date format '{}'", config.date_format))
            })?;

            let cells = vec![
                self.text(&date),
                self.text(txn.description()),
                self.text(txn.category_name()),
                self.text(txn.kind.as_str()),
                CellValue::Number(round_cents(txn.amount)),
                self.text(txn.currency_or(&config.default_currency)),
            ];
            sheet.push_row(cells);
        }
        Ok(sheet)
    }
}

/// Round to 2 decimal places, halves away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
