//! Error types for the dashboard.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Malformed query parameter.
    #[error("{0}")]
    BadRequest(String),
}

impl DashboardError {
    fn status(&self) -> StatusCode {
        match self {
            DashboardError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            DashboardError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            DashboardError::Database(err) if status.is_server_error() => {
                tracing::error!("Database error: {}", err);
            }
            _ => tracing::debug!(%status, "Request failed: {}", self),
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for dashboard handlers.
pub type Result<T> = std::result::Result<T, DashboardError>;
