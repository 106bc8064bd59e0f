//! Transaction listing, lookup and search endpoints.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use database::{transaction, StoredTransaction, TransactionFilter};
use extractor::Category;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Query parameters accepted by the listing endpoint and the dashboard page.
///
/// Values arrive as raw strings so that empty form fields mean "no filter".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
}

impl TransactionQuery {
    /// Convert into a store filter, rejecting unparseable values.
    pub fn to_filter(&self) -> Result<TransactionFilter> {
        let category = non_empty(&self.category)
            .map(|name| {
                Category::from_str(&name).map_err(|err| DashboardError::BadRequest(err.to_string()))
            })
            .transpose()?;

        let limit: Option<i64> = parse_param("limit", &self.limit)?;
        if limit.is_some_and(|limit| limit < 0) {
            return Err(DashboardError::BadRequest(
                "limit must not be negative".to_string(),
            ));
        }

        Ok(TransactionFilter {
            category,
            start_date: non_empty(&self.start_date),
            end_date: non_empty(&self.end_date),
            min_amount: parse_param("min_amount", &self.min_amount)?,
            max_amount: parse_param("max_amount", &self.max_amount)?,
            search: non_empty(&self.search),
            limit,
        })
    }
}

/// Query parameters for the search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// List transactions matching the query filters.
pub async fn list_api(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<Vec<StoredTransaction>>>> {
    let filter = query.to_filter()?;
    let rows = transaction::list_transactions(state.db.pool(), &filter).await?;
    Ok(ApiResponse::ok(rows))
}

/// Fetch a single transaction.
pub async fn get_api(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<StoredTransaction>>> {
    let row = transaction::get_transaction(state.db.pool(), id).await?;
    Ok(ApiResponse::ok(row))
}

/// Free-text search. An empty query matches everything.
pub async fn search_api(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<StoredTransaction>>>> {
    let filter = TransactionFilter {
        search: non_empty(&query.query),
        ..TransactionFilter::default()
    };
    let rows = transaction::list_transactions(state.db.pool(), &filter).await?;
    Ok(ApiResponse::ok(rows))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_param<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>> {
    non_empty(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| DashboardError::BadRequest(format!("invalid {name}: {raw}")))
        })
        .transpose()
}
