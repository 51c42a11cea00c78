//! Transaction and category records supplied by the data layer.
//!
//! The exporter only reads these. Field names follow the data layer's JSON
//! (`snake_case`, `type` for the transaction kind).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Grouping key used for transactions without any category.
pub const UNCATEGORIZED_KEY: &str = "uncategorized";

/// Display name used for transactions (or categories) without a name.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Fallback description when neither raw description nor merchant is set.
pub const MISSING_DESCRIPTION: &str = "N/A";

/// Whether money left or entered the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

/// A spending category. Owned by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            icon: None,
        }
    }

    /// Name to show in the workbook; never empty.
    pub fn display_name(&self) -> &str {
        non_empty(self.name.as_deref()).unwrap_or(UNCATEGORIZED_NAME)
    }
}

/// A single financial transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub raw_description: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category_user: Option<Category>,
    #[serde(default)]
    pub category_ai: Option<Category>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            currency: None,
            kind,
            occurred_at,
            raw_description: None,
            merchant: None,
            category_user: None,
            category_ai: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category_user = Some(category);
        self
    }

    #[must_use]
    pub fn with_ai_category(mut self, category: Category) -> Self {
        self.category_ai = Some(category);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw_description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// User override first, then the AI suggestion.
    pub fn effective_category(&self) -> Option<&Category> {
        self.category_user.as_ref().or(self.category_ai.as_ref())
    }

    /// Key the aggregator groups by.
    pub fn category_key(&self) -> &str {
        self.effective_category()
            .map_or(UNCATEGORIZED_KEY, |c| c.id.as_str())
    }

    pub fn category_name(&self) -> &str {
        self.effective_category()
            .map_or(UNCATEGORIZED_NAME, Category::display_name)
    }

    pub fn description(&self) -> &str {
        non_empty(self.raw_description.as_deref())
            .or_else(|| non_empty(self.merchant.as_deref()))
            .unwrap_or(MISSING_DESCRIPTION)
    }

    pub fn currency_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(self.currency.as_deref()).unwrap_or(default)
    }

    /// Amount with its sign taken from the kind, not from the stored value.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Expense => -self.amount.abs(),
            TransactionKind::Income => self.amount.abs(),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
