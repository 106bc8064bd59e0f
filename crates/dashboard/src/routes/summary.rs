//! Aggregate endpoints.

use axum::extract::State;
use axum::Json;
use database::{transaction, StoredTransaction, Totals, TransactionType};
use extractor::Category;
use serde::Serialize;

use crate::error::Result;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Recent transactions included in the summary payload.
const SUMMARY_RECENT: i64 = 5;

/// Totals for one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotals {
    pub category: Category,
    pub label: &'static str,
    pub count: i64,
    pub total_amount: f64,
}

/// Totals for one `YYYY-MM` month.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthTotals {
    pub month: String,
    pub count: i64,
    pub total_amount: f64,
}

/// Everything the dashboard's overview needs.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_transactions: i64,
    /// Sorted by total amount, largest first.
    pub by_type: Vec<CategoryTotals>,
    /// Ascending by month.
    pub monthly: Vec<MonthTotals>,
    pub recent: Vec<StoredTransaction>,
}

impl Summary {
    /// Totals for `month`, zero when nothing was recorded.
    pub fn month(&self, month: &str) -> MonthTotals {
        self.monthly
            .iter()
            .find(|m| m.month == month)
            .cloned()
            .unwrap_or_else(|| MonthTotals {
                month: month.to_string(),
                ..MonthTotals::default()
            })
    }
}

/// Summary JSON.
pub async fn summary_api(State(state): State<AppState>) -> Result<Json<ApiResponse<Summary>>> {
    let summary = load_summary(&state, SUMMARY_RECENT).await?;
    Ok(ApiResponse::ok(summary))
}

/// Category reference table.
pub async fn types_api(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionType>>>> {
    let types = transaction::list_transaction_types(state.db.pool()).await?;
    Ok(ApiResponse::ok(types))
}

/// Gather counts, per-category and per-month totals and the latest rows.
pub(crate) async fn load_summary(state: &AppState, recent: i64) -> Result<Summary> {
    let pool = state.db.pool();

    let total_transactions = transaction::count_transactions(pool).await?;
    let by_category = transaction::summary_by_category(pool).await?;
    let by_month = transaction::summary_by_month(pool).await?;
    let recent = if recent > 0 {
        transaction::recent_transactions(pool, recent).await?
    } else {
        Vec::new()
    };

    let mut by_type: Vec<CategoryTotals> = by_category
        .into_iter()
        .map(|(category, Totals { count, total_amount })| CategoryTotals {
            category,
            label: category.label(),
            count,
            total_amount,
        })
        .collect();
    by_type.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));

    let monthly = by_month
        .into_iter()
        .map(|(month, Totals { count, total_amount })| MonthTotals {
            month,
            count,
            total_amount,
        })
        .collect();

    Ok(Summary {
        total_transactions,
        by_type,
        monthly,
        recent,
    })
}
