//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub transactions: i64,
}

/// Health check endpoint. Fails if the store is unreachable.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    let transactions = database::transaction::count_transactions(state.db.pool()).await?;

    Ok(Json(Health {
        status: "ok".to_string(),
        transactions,
    }))
}
