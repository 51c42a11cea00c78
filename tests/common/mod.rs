//! Common fixtures for statement export tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use statement_xlsx::{Category, ExportConfig, Transaction, TransactionKind};

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap()
}

pub fn expense(id: &str, amount: &str, day: u32) -> Transaction {
    Transaction::new(id, dec(amount), TransactionKind::Expense, date(2024, 1, day))
}

pub fn income(id: &str, amount: &str, day: u32) -> Transaction {
    Transaction::new(id, dec(amount), TransactionKind::Income, date(2024, 1, day))
}

pub fn food() -> Category {
    Category::new("food", "Food")
}

pub fn salary() -> Category {
    Category::new("salary", "Salary")
}

/// Two Food expenses (100, 50) and one Salary income (1000) on distinct dates.
pub fn food_and_salary() -> Vec<Transaction> {
    vec![
        expense("t1", "100", 1).with_category(food()),
        expense("t2", "50", 2).with_category(food()),
        income("t3", "1000", 3).with_category(salary()),
    ]
}

/// A larger mixed statement: several categories, AI-only and uncategorized rows.
pub fn mixed_statement(count: usize) -> Vec<Transaction> {
    let categories = [
        Some(food()),
        Some(salary()),
        Some(Category::new("rent", "Rent & Utilities")),
        None,
    ];
    (0..count)
        .map(|i| {
            let day = u32::try_from(i % 28).unwrap() + 1;
            let amount = format!("{}.{:02}", (i * 37) % 5000, i % 100);
            let txn = if i % 5 == 0 {
                income(&format!("m{i}"), &amount, day)
            } else {
                expense(&format!("m{i}"), &amount, day)
            };
            let txn = txn.with_merchant(format!("Merchant <{}>", i % 13));
            match &categories[i % categories.len()] {
                Some(cat) if i % 7 == 0 => txn.with_ai_category(cat.clone()),
                Some(cat) => txn.with_category(cat.clone()),
                None => txn,
            }
        })
        .collect()
}

pub fn config_in(dir: &std::path::Path) -> ExportConfig {
    ExportConfig {
        output_dir: Some(dir.to_path_buf()),
        utc_offset: Some("+05:30".into()),
        ..ExportConfig::default()
    }
}
