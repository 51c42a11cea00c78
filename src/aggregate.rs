//! Groups transactions by effective category and totals each group.

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::error::{ExportError, Result};
use crate::model::Transaction;

/// Transactions that share an effective category.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    /// Display name taken from the first transaction seen in the group.
    pub name: &'a str,
    pub transactions: Vec<&'a Transaction>,
    /// Sum of sign-normalized amounts (expenses negative, income positive).
    pub total: Decimal,
}

impl CategoryGroup<'_> {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Output of [`aggregate`]. Groups iterate in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct Aggregate<'a> {
    pub groups: IndexMap<&'a str, CategoryGroup<'a>>,
}

impl<'a> Aggregate<'a> {
    pub fn category_count(&self) -> usize {
        self.groups.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.groups.values().map(CategoryGroup::len).sum()
    }

    pub fn totals_by_category(&self) -> IndexMap<&'a str, Decimal> {
        self.groups
            .iter()
            .map(|(key, group)| (*key, group.total))
            .collect()
    }

    pub fn group(&self, key: &str) -> Option<&CategoryGroup<'a>> {
        self.groups.get(key)
    }
}

/// Group `transactions` by effective category.
///
/// # Errors
/// Returns [`ExportError::EmptyInput`] when `transactions` is empty.
pub fn aggregate(transactions: &[Transaction]) -> Result<Aggregate<'_>> {
    if transactions.is_empty() {
        return Err(ExportError::EmptyInput);
    }

    let mut groups: IndexMap<&str, CategoryGroup<'_>> = IndexMap::new();
    for txn in transactions {
        let group = groups
            .entry(txn.category_key())
            .or_insert_with(|| CategoryGroup {
                name: txn.category_name(),
                transactions: Vec::new(),
                total: Decimal::ZERO,
            });
        group.transactions.push(txn);
        group.total += txn.signed_amount();
    }

    tracing::debug!(
        transactions = transactions.len(),
        categories = groups.len(),
        "aggregated transactions"
    );

    Ok(Aggregate { groups })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::{Category, TransactionKind, UNCATEGORIZED_KEY};
    use chrono::{TimeZone, Utc};

    fn txn(id: &str, amount: &str, kind: TransactionKind, cat: Option<(&str, &str)>) -> Transaction {
        let t = Transaction::new(
            id,
            amount.parse().unwrap(),
            kind,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        match cat {
            Some((cid, name)) => t.with_category(Category::new(cid, name)),
            None => t,
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = aggregate(&[]).unwrap_err();
        assert!(err.is_empty_input());
    }

    #[test]
    fn test_groups_in_first_encounter_order() {
        let txns = vec![
            txn("1", "100", TransactionKind::Expense, Some(("food", "Food"))),
            txn("2", "1000", TransactionKind::Income, Some(("salary", "Salary"))),
            txn("3", "50", TransactionKind::Expense, Some(("food", "Food"))),
        ];
        let agg = aggregate(&txns).unwrap();
        let keys: Vec<_> = agg.groups.keys().copied().collect();
        assert_eq!(keys, vec!["food", "salary"]);
        assert_eq!(agg.group("food").unwrap().len(), 2);
        assert_eq!(agg.group("food").unwrap().total, "-150".parse().unwrap());
        assert_eq!(agg.group("salary").unwrap().total, "1000".parse().unwrap());
    }

    #[test]
    fn test_every_transaction_in_exactly_one_group() {
        let txns: Vec<_> = (0..25)
            .map(|i| {
                let cat = match i % 3 {
                    0 => Some(("a", "A")),
                    1 => Some(("b", "B")),
                    _ => None,
                };
                txn(&i.to_string(), "1", TransactionKind::Expense, cat)
            })
            .collect();
        let agg = aggregate(&txns).unwrap();
        assert_eq!(agg.transaction_count(), txns.len());

        let mut seen: Vec<&str> = agg
            .groups
            .values()
            .flat_map(|g| g.transactions.iter().map(|t| t.id.as_str()))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), txns.len());
    }

    #[test]
    fn test_totals_are_sign_normalized_by_kind() {
        let txns = vec![
            txn("1", "-40", TransactionKind::Expense, Some(("x", "X"))),
            txn("2", "60", TransactionKind::Expense, Some(("x", "X"))),
            txn("3", "-25", TransactionKind::Income, Some(("x", "X"))),
        ];
        let agg = aggregate(&txns).unwrap();
        let totals = agg.totals_by_category();
        assert_eq!(totals["x"], "-75".parse().unwrap());
    }

    #[test]
    fn test_uncategorized_bucket() {
        let txns = vec![txn("1", "5", TransactionKind::Expense, None)];
        let agg = aggregate(&txns).unwrap();
        let group = agg.group(UNCATEGORIZED_KEY).unwrap();
        assert_eq!(group.name, "Uncategorized");
        assert_eq!(agg.category_count(), 1);
    }
}
