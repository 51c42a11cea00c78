//! End-to-end export tests: sheet content and invariants of generated workbooks.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use std::path::PathBuf;

use chrono::TimeZone;
use common::*;
use statement_xlsx::delivery::FixedFolder;
use statement_xlsx::reader::{read_package, verify, ReadValue};
use statement_xlsx::{
    aggregate, Delivery, DeliveryChain, DeliveryOutcome, DeliveryStatus, ExportError,
    ExportedFile, SaveToFolder, StatementExporter, Transaction, TransactionKind,
};

fn exporter(dir: &std::path::Path) -> StatementExporter {
    StatementExporter::new(config_in(dir)).unwrap()
}

// ============================================================================
// Sheet content
// ============================================================================

#[test]
fn test_summary_rows_for_two_categories() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = exporter(dir.path()).to_bytes(&food_and_salary()).unwrap();
    let package = verify(&bytes).unwrap();
    let summary = package.sheet("Summary").unwrap();

    assert_eq!(summary.row_texts(1), vec!["Statement Export Summary"]);
    assert_eq!(summary.row_texts(2), vec!["Total Transactions", "3"]);
    assert_eq!(summary.row_texts(3), vec!["Total Categories", "2"]);
    assert!(summary.row_texts(4).is_empty());
    assert_eq!(
        summary.row_texts(5),
        vec!["Category", "Transaction Count", "Total Amount"]
    );
    assert_eq!(summary.row_texts(6), vec!["Food", "2", "-150"]);
    assert_eq!(summary.row_texts(7), vec!["Salary", "1", "1000"]);
    assert_eq!(summary.dimension.as_deref(), Some("A1:C7"));
}

#[test]
fn test_missing_categories_grouped_as_uncategorized() {
    let txns = vec![expense("t1", "20", 5)];
    let grouped = aggregate(&txns).unwrap();
    assert!(grouped.group("uncategorized").is_some());

    let dir = tempfile::tempdir().unwrap();
    let package = verify(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();
    assert_eq!(
        package.sheet("Summary").unwrap().row_texts(6),
        vec!["Uncategorized", "1", "-20"]
    );
    assert_eq!(
        package.sheet("Transactions").unwrap().cell_text(2, 2),
        Some("Uncategorized")
    );
}

#[test]
fn test_transactions_listed_newest_first() {
    let txns = vec![
        expense("old", "10", 1).with_description("older"),
        expense("new", "10", 3).with_description("newer"),
    ];
    let dir = tempfile::tempdir().unwrap();
    let package = verify(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();
    let sheet = package.sheet("Transactions").unwrap();
    assert_eq!(
        sheet.row_texts(1),
        vec!["Date", "Description", "Category", "Type", "Amount", "Currency"]
    );
    assert_eq!(sheet.cell_text(2, 0), Some("3/1/2024"));
    assert_eq!(sheet.cell_text(2, 1), Some("newer"));
    assert_eq!(sheet.cell_text(3, 0), Some("1/1/2024"));
    assert_eq!(sheet.cell_text(3, 1), Some("older"));
}

#[test]
fn test_dates_follow_display_offset() {
    // 20:00 UTC on the 2nd is 01:30 on the 3rd at +05:30.
    let late = Transaction::new(
        "late",
        dec("75"),
        TransactionKind::Expense,
        chrono::Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(),
    );
    let dir = tempfile::tempdir().unwrap();
    let package = verify(&exporter(dir.path()).to_bytes(&[late]).unwrap()).unwrap();
    assert_eq!(
        package.sheet("Transactions").unwrap().cell_text(2, 0),
        Some("3/1/2024")
    );
}

#[test]
fn test_control_characters_survive_export() {
    let txns = vec![expense("x", "12", 4).with_description("UPI\u{1}REF\u{8}")];
    let dir = tempfile::tempdir().unwrap();
    let bytes = exporter(dir.path()).to_bytes(&txns).unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice())).unwrap();
    let mut sst = Vec::new();
    std::io::Read::read_to_end(&mut archive.by_name("xl/sharedStrings.xml").unwrap(), &mut sst)
        .unwrap();
    assert!(!sst.iter().any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')));

    let package = verify(&bytes).unwrap();
    assert_eq!(
        package.sheet("Transactions").unwrap().cell_text(2, 1),
        Some("UPI\u{1}REF\u{8}")
    );
}

struct CancellingPicker;

impl statement_xlsx::FolderPicker for CancellingPicker {
    fn pick_folder(&self, _suggested_name: &str) -> Option<PathBuf> {
        None
    }
}

#[test]
fn test_cancelled_save_is_success() {
    let dir = tempfile::tempdir().unwrap();
    let chain = DeliveryChain::new().with(SaveToFolder::new(CancellingPicker));
    let outcome = exporter(dir.path())
        .with_delivery(chain)
        .export("Jan", &food_and_salary())
        .unwrap();
    assert!(outcome.was_cancelled());
    assert!(!outcome.was_delivered());
    assert!(outcome.file.path.exists());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_grouping_completeness() {
    for size in [1, 2, 17, 250] {
        let txns = mixed_statement(size);
        let grouped = aggregate(&txns).unwrap();
        assert_eq!(grouped.transaction_count(), size);

        let dir = tempfile::tempdir().unwrap();
        let package = verify(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();
        let summary = package.sheet("Summary").unwrap();
        let counted: usize = (6..=summary.rows.len())
            .map(|row| {
                let row = u32::try_from(row).unwrap();
                summary.cell_text(row, 1).unwrap().parse::<usize>().unwrap()
            })
            .sum();
        assert_eq!(counted, size);
    }
}

#[test]
fn test_totals_follow_kind_not_stored_sign() {
    let txns = vec![
        expense("a", "-30", 1).with_category(food()),
        expense("b", "20", 2).with_category(food()),
        income("c", "-500", 3).with_category(salary()),
    ];
    let dir = tempfile::tempdir().unwrap();
    let package = verify(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();
    let summary = package.sheet("Summary").unwrap();
    assert_eq!(summary.row_texts(6), vec!["Food", "2", "-50"]);
    assert_eq!(summary.row_texts(7), vec!["Salary", "1", "500"]);

    // The Transactions sheet keeps the stored sign.
    let details = package.sheet("Transactions").unwrap();
    assert_eq!(details.cell_text(2, 4), Some("-500"));
    assert_eq!(details.cell_text(4, 4), Some("-30"));
}

#[test]
fn test_shared_strings_unique_and_numbers_inline() {
    let txns = mixed_statement(120);
    let dir = tempfile::tempdir().unwrap();
    let package = read_package(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();

    let mut strings = package.shared_strings.clone();
    strings.sort();
    strings.dedup();
    assert_eq!(strings.len(), package.shared_strings.len());

    for sheet in &package.sheets {
        for row in &sheet.rows {
            for cell in &row.cells {
                match &cell.value {
                    ReadValue::Text { index, text } => {
                        assert_eq!(&package.shared_strings[*index], text);
                        assert!(text.parse::<f64>().is_err() || text.contains('/'), "{text}");
                    }
                    ReadValue::Number(n) => assert!(n.parse::<f64>().is_ok(), "{n}"),
                }
            }
        }
    }
    assert!(package.shared_strings.iter().any(|s| s == "Rent & Utilities"));
    assert!(package.shared_strings.iter().any(|s| s == "Merchant <3>"));
}

#[test]
fn test_dimensions_match_content() {
    for size in [1, 9, 10, 99, 100] {
        let txns = mixed_statement(size);
        let dir = tempfile::tempdir().unwrap();
        let package = verify(&exporter(dir.path()).to_bytes(&txns).unwrap()).unwrap();
        let details = package.sheet("Transactions").unwrap();
        assert_eq!(
            details.dimension.as_deref(),
            Some(format!("A1:F{}", size + 1).as_str())
        );
        let summary = package.sheet("Summary").unwrap();
        assert_eq!(
            summary.dimension.as_deref(),
            Some(format!("A1:C{}", summary.rows.len()).as_str())
        );
    }
}

#[test]
fn test_round_trip_openability() {
    let txns = mixed_statement(42);
    let dir = tempfile::tempdir().unwrap();
    let outcome = exporter(dir.path()).export("Round trip", &txns).unwrap();
    let bytes = std::fs::read(&outcome.file.path).unwrap();
    let package = read_package(&bytes).unwrap();
    assert_eq!(package.sheet_names(), vec!["Summary", "Transactions"]);
    assert_eq!(package.sheet("Transactions").unwrap().rows.len(), txns.len() + 1);
}

#[test]
fn test_empty_input_rejected_without_writes() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");
    let err = exporter(&out).export("Empty", &[]).unwrap_err();
    assert!(matches!(err, ExportError::EmptyInput));
    assert!(!out.exists());
}

// ============================================================================
// Files and delivery
// ============================================================================

#[test]
fn test_file_name_contract() {
    let dir = tempfile::tempdir().unwrap();
    let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let outcome = exporter(dir.path())
        .export_at("HDFC Mar/2024 (1).pdf", &food_and_salary(), at)
        .unwrap();
    assert_eq!(
        outcome.file.file_name,
        format!("Statement_HDFC_Mar_2024__1__pdf_{}.xlsx", at.timestamp_millis())
    );
    assert_eq!(outcome.file.path.parent(), Some(dir.path()));
}

#[test]
fn test_same_timestamp_does_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let exporter = exporter(dir.path());
    let first = exporter.export_at("Jan", &food_and_salary(), at).unwrap();
    let second = exporter.export_at("Jan", &mixed_statement(3), at).unwrap();
    assert_ne!(first.file.path, second.file.path);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_save_to_folder_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = dir.path().join("Downloads");
    let chain = DeliveryChain::new().with(SaveToFolder::new(FixedFolder(downloads.clone())));
    let outcome = exporter(&dir.path().join("scratch"))
        .with_delivery(chain)
        .export("Jan", &food_and_salary())
        .unwrap();
    let DeliveryStatus::Completed(DeliveryOutcome::Delivered {
        channel,
        location: Some(saved),
    }) = &outcome.delivery
    else {
        panic!("unexpected delivery status {:?}", outcome.delivery);
    };
    assert_eq!(*channel, "save");
    assert_eq!(saved.parent(), Some(downloads.as_path()));
    assert_eq!(
        std::fs::read(saved).unwrap(),
        std::fs::read(&outcome.file.path).unwrap()
    );
}

struct FailingShare;

impl Delivery for FailingShare {
    fn channel(&self) -> &'static str {
        "share"
    }
    fn is_available(&self) -> bool {
        true
    }
    fn deliver(&self, _file: &ExportedFile) -> statement_xlsx::error::Result<DeliveryOutcome> {
        Err(ExportError::Delivery {
            channel: "share",
            reason: "sheet dismissed with error".into(),
        })
    }
}

#[test]
fn test_delivery_failure_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = exporter(dir.path())
        .with_delivery(DeliveryChain::new().with(FailingShare))
        .export("Jan", &food_and_salary())
        .unwrap();
    assert!(matches!(outcome.delivery, DeliveryStatus::Failed(ExportError::Delivery { .. })));
    assert!(outcome.file.path.exists());
}

#[test]
fn test_unavailable_native_falls_back_to_share() {
    struct Unavailable;
    impl statement_xlsx::FolderPicker for Unavailable {
        fn is_available(&self) -> bool {
            false
        }
        fn pick_folder(&self, _suggested_name: &str) -> Option<PathBuf> {
            None
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let chain = DeliveryChain::new()
        .with(SaveToFolder::new(Unavailable))
        .with(FailingShare);
    let outcome = exporter(dir.path())
        .with_delivery(chain)
        .export("Jan", &food_and_salary())
        .unwrap();
    let DeliveryStatus::Failed(ExportError::Delivery { channel, .. }) = outcome.delivery else {
        panic!("expected the share fallback to be used");
    };
    assert_eq!(channel, "share");
}
