//! Dashboard page.

use askama::Template;
use axum::extract::{Query, State};
use chrono::Local;
use database::{transaction, StoredTransaction};
use extractor::Category;

use crate::error::Result;
use crate::routes::summary::{load_summary, MonthTotals};
use crate::routes::transactions::TransactionQuery;
use crate::state::AppState;

/// Rows shown when the request sets no limit.
const PAGE_LIMIT: i64 = 50;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub total_transactions: i64,
    pub current_month: MonthRow,
    pub categories: Vec<CategoryRow>,
    pub months: Vec<MonthRow>,
    pub transactions: Vec<TransactionRow>,
    pub filters: FilterForm,
    pub category_options: Vec<CategoryOption>,
}

/// A per-category line with a display-ready total.
pub struct CategoryRow {
    pub label: &'static str,
    pub count: i64,
    pub total: String,
}

/// A per-month line with a display-ready total.
pub struct MonthRow {
    pub month: String,
    pub count: i64,
    pub total: String,
}

impl From<MonthTotals> for MonthRow {
    fn from(totals: MonthTotals) -> Self {
        Self {
            month: totals.month,
            count: totals.count,
            total: format_amount(totals.total_amount),
        }
    }
}

/// One transaction in the listing.
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub label: &'static str,
    pub amount: String,
    pub counterparty: String,
    pub tx_id: String,
}

impl From<StoredTransaction> for TransactionRow {
    fn from(row: StoredTransaction) -> Self {
        Self {
            id: row.id,
            date: row.transaction_date.replace('T', " "),
            label: row.category.label(),
            amount: format_amount(row.amount),
            counterparty: row.counterparty.unwrap_or_else(|| "-".to_string()),
            tx_id: row.tx_id.unwrap_or_default(),
        }
    }
}

/// Current filter values, echoed back into the form.
#[derive(Default)]
pub struct FilterForm {
    pub start_date: String,
    pub end_date: String,
    pub min_amount: String,
    pub max_amount: String,
    pub search: String,
}

impl From<&TransactionQuery> for FilterForm {
    fn from(query: &TransactionQuery) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            start_date: field(&query.start_date),
            end_date: field(&query.end_date),
            min_amount: field(&query.min_amount),
            max_amount: field(&query.max_amount),
            search: field(&query.search),
        }
    }
}

/// An entry of the category select box.
pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Render the dashboard page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<DashboardTemplate> {
    let mut filter = query.to_filter()?;
    filter.limit.get_or_insert(PAGE_LIMIT);

    let summary = load_summary(&state, 0).await?;
    let rows = transaction::list_transactions(state.db.pool(), &filter).await?;

    let this_month = Local::now().format("%Y-%m").to_string();

    let category_options = Category::ALL
        .iter()
        .map(|category| CategoryOption {
            value: category.as_str(),
            label: category.label(),
            selected: filter.category == Some(*category),
        })
        .collect();

    Ok(DashboardTemplate {
        total_transactions: summary.total_transactions,
        current_month: summary.month(&this_month).into(),
        categories: summary
            .by_type
            .into_iter()
            .map(|c| CategoryRow {
                label: c.label,
                count: c.count,
                total: format_amount(c.total_amount),
            })
            .collect(),
        months: summary.monthly.into_iter().map(MonthRow::from).collect(),
        transactions: rows.into_iter().map(TransactionRow::from).collect(),
        filters: FilterForm::from(&query),
        category_options,
    })
}

/// Format an amount as `12,300,000 RWF`, keeping cents only when present.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();

    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match cents % 100 {
        0 => format!("{sign}{grouped} RWF"),
        fraction => format!("{sign}{grouped}.{fraction:02} RWF"),
    }
}
