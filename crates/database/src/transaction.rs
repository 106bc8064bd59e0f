//! Transaction persistence and aggregate queries.

use std::collections::BTreeMap;

use extractor::{Category, ParsedTransaction};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DatabaseError, Result};
use crate::models::{StoredTransaction, Totals, TransactionFilter, TransactionType};

const SELECT_TRANSACTIONS: &str = r#"
    SELECT id, transaction_date, category, amount, counterparty, tx_id, fee,
           message_body, readable_date, processed_at
    FROM transactions
"#;

/// SQL twin of `Category::normalize_name`.
const NORMALIZED_CATEGORY: &str =
    "REPLACE(REPLACE(LOWER(TRIM(category)), ' ', '_'), '-', '_')";

/// Insert a batch of parsed transactions atomically.
///
/// Every record must satisfy the validity rule (date and amount present);
/// if any does not, nothing is written. Returns the number of rows inserted.
pub async fn insert_transactions(
    pool: &SqlitePool,
    transactions: &[ParsedTransaction],
) -> Result<u64> {
    for (index, txn) in transactions.iter().enumerate() {
        txn.validate()
            .map_err(|reason| DatabaseError::Invalid { index, reason })?;
    }

    if transactions.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for txn in transactions {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (transaction_date, category, amount, counterparty, tx_id, fee,
                 message_body, readable_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(txn.date.as_deref())
        .bind(txn.category.as_str())
        .bind(txn.amount)
        .bind(txn.counterparty.as_deref())
        .bind(txn.tx_id.as_deref())
        .bind(txn.fee)
        .bind(&txn.raw_body)
        .bind(txn.source_readable_date.as_deref())
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;

    info!(inserted, "Inserted transactions");
    Ok(inserted)
}

/// List transactions matching `filter`, newest first.
pub async fn list_transactions(
    pool: &SqlitePool,
    filter: &TransactionFilter,
) -> Result<Vec<StoredTransaction>> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_TRANSACTIONS);
    query.push(" WHERE 1 = 1");

    // Same mapping as `Category::coerce`, so filtered rows read back with
    // the category they were filtered on.
    match filter.category {
        Some(Category::Other) => {
            query.push(format!(" AND {NORMALIZED_CATEGORY} NOT IN ("));
            let mut names = query.separated(", ");
            for category in Category::ALL.iter().filter(|c| **c != Category::Other) {
                for alias in category.aliases() {
                    names.push_bind(*alias);
                }
            }
            names.push_unseparated(")");
        }
        Some(category) => {
            query.push(format!(" AND {NORMALIZED_CATEGORY} IN ("));
            let mut names = query.separated(", ");
            for alias in category.aliases() {
                names.push_bind(*alias);
            }
            names.push_unseparated(")");
        }
        None => {}
    }

    if let Some(start) = &filter.start_date {
        query.push(" AND transaction_date >= ").push_bind(start.clone());
    }
    if let Some(end) = &filter.end_date {
        query.push(" AND transaction_date <= ").push_bind(end_of_day(end));
    }
    if let Some(min) = filter.min_amount {
        query.push(" AND amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        query.push(" AND amount <= ").push_bind(max);
    }

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        query
            .push(" AND (LOWER(category) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(counterparty, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR CAST(amount AS TEXT) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(tx_id, '') LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query.push(" ORDER BY transaction_date DESC, id DESC");

    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(limit);
    }

    let rows = query
        .build_query_as::<StoredTransaction>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// The most recent `limit` transactions.
pub async fn recent_transactions(pool: &SqlitePool, limit: i64) -> Result<Vec<StoredTransaction>> {
    list_transactions(pool, &TransactionFilter::default().with_limit(limit)).await
}

/// Get a transaction by ID.
pub async fn get_transaction(pool: &SqlitePool, id: i64) -> Result<StoredTransaction> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_TRANSACTIONS);
    query.push(" WHERE id = ").push_bind(id);

    query
        .build_query_as::<StoredTransaction>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Transaction",
            id: id.to_string(),
        })
}

/// Count stored transactions.
pub async fn count_transactions(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM transactions
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count and total amount per category.
///
/// Unknown stored category names are folded into `other`.
pub async fn summary_by_category(pool: &SqlitePool) -> Result<BTreeMap<Category, Totals>> {
    let rows = sqlx::query_as::<_, (String, i64, f64)>(
        r#"
        SELECT category, COUNT(*) AS count, TOTAL(amount) AS total
        FROM transactions
        GROUP BY category
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut summary = BTreeMap::new();
    for (category, count, total) in rows {
        summary
            .entry(Category::coerce(&category))
            .or_insert_with(Totals::default)
            .add(count, total);
    }

    Ok(summary)
}

/// Count and total amount per `YYYY-MM`, in ascending month order.
pub async fn summary_by_month(pool: &SqlitePool) -> Result<BTreeMap<String, Totals>> {
    let rows = sqlx::query_as::<_, (Option<String>, i64, f64)>(
        r#"
        SELECT strftime('%Y-%m', transaction_date) AS month,
               COUNT(*) AS count,
               TOTAL(amount) AS total
        FROM transactions
        GROUP BY month
        ORDER BY month
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut summary = BTreeMap::new();
    for (month, count, total) in rows {
        match month {
            Some(month) => summary
                .entry(month)
                .or_insert_with(Totals::default)
                .add(count, total),
            None => debug!(count, "Skipping transactions with unreadable dates"),
        }
    }

    Ok(summary)
}

/// List the category reference table.
pub async fn list_transaction_types(pool: &SqlitePool) -> Result<Vec<TransactionType>> {
    let types = sqlx::query_as::<_, TransactionType>(
        r#"
        SELECT type_id, type_name, description
        FROM transaction_types
        ORDER BY type_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(types)
}

fn end_of_day(end: &str) -> String {
    if end.len() == 10 {
        format!("{end}T23:59:59")
    } else {
        end.to_string()
    }
}
