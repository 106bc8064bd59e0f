//! Database models.

use extractor::Category;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A persisted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Normalized date (`YYYY-MM-DDTHH:MM:SS`).
    pub transaction_date: String,
    /// Category; unknown stored values read back as `other`.
    pub category: Category,
    pub amount: f64,
    /// Sender or recipient, depending on the category.
    pub counterparty: Option<String>,
    /// Provider transaction ID, if the message carried one.
    pub tx_id: Option<String>,
    pub fee: Option<f64>,
    /// Original message body.
    pub message_body: String,
    /// Display date from the exporter.
    pub readable_date: Option<String>,
    /// Insertion timestamp.
    pub processed_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for StoredTransaction {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;

        Ok(Self {
            id: row.try_get("id")?,
            transaction_date: row.try_get("transaction_date")?,
            category: Category::coerce(&category),
            amount: row.try_get("amount")?,
            counterparty: row.try_get("counterparty")?,
            tx_id: row.try_get("tx_id")?,
            fee: row.try_get("fee")?,
            message_body: row.try_get("message_body")?,
            readable_date: row.try_get("readable_date")?,
            processed_at: row.try_get("processed_at")?,
        })
    }
}

/// Count and summed amount for a group of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub count: i64,
    pub total_amount: f64,
}

impl Totals {
    pub(crate) fn add(&mut self, count: i64, total_amount: f64) {
        self.count += count;
        self.total_amount += total_amount;
    }
}

/// A row of the category reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TransactionType {
    pub type_id: i64,
    pub type_name: String,
    pub description: String,
}

/// Filters for listing transactions. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub category: Option<Category>,
    /// Inclusive lower bound on the transaction date.
    pub start_date: Option<String>,
    /// Inclusive upper bound. A bare `YYYY-MM-DD` covers that whole day.
    pub end_date: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Case-insensitive match against category, counterparty, amount and
    /// transaction ID.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

impl TransactionFilter {
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_date_range(
        mut self,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }

    pub fn with_amount_range(mut self, min_amount: f64, max_amount: f64) -> Self {
        self.min_amount = Some(min_amount);
        self.max_amount = Some(max_amount);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}
