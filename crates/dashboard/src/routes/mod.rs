//! Route handlers for the dashboard.

pub mod dashboard;
pub mod health;
pub mod summary;
pub mod transactions;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Envelope for successful JSON responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/", get(dashboard::dashboard_page))
        // Health check
        .route("/health", get(health::health))
        // API endpoints
        .route("/api/transactions", get(transactions::list_api))
        .route("/api/transactions/:id", get(transactions::get_api))
        .route("/api/search", get(transactions::search_api))
        .route("/api/summary", get(summary::summary_api))
        .route("/api/types", get(summary::types_api))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use database::Database;
    use extractor::{BatchParser, FieldExtractor, NullReporter, RawMessage};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let messages = vec![
            RawMessage::new(
                "You have received 5,000 RWF from John Doe (0788123456) at 2024-05-10 10:30:00",
            ),
            RawMessage::new(
                "TxId: 73214484437. Your payment of 1,000 RWF to Jane Smith 12845 has been \
                 completed at 2024-05-10 16:31:39. Your new balance: 1,000 RWF. Fee was 0 RWF.",
            ),
        ];
        let parser = BatchParser::new(FieldExtractor::default(), Arc::new(NullReporter));
        let batch = parser.process(&messages).unwrap();
        database::transaction::insert_transactions(db.pool(), &batch.accepted)
            .await
            .unwrap();

        router().with_state(AppState::new(db))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(test_app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["transactions"], 2);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let (status, body) = get_json(test_app().await, "/api/transactions?type=payment").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "payment");
        assert_eq!(rows[0]["amount"], 1000.0);
        assert_eq!(rows[0]["tx_id"], "73214484437");
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_type() {
        let (status, body) = get_json(test_app().await, "/api/transactions?type=lottery").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "unknown category: lottery");
    }

    #[tokio::test]
    async fn test_get_missing_transaction() {
        let (status, body) = get_json(test_app().await, "/api/transactions/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_search() {
        let (_, body) = get_json(test_app().await, "/api/search?query=john").await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "incoming");

        let (_, body) = get_json(test_app().await, "/api/search?query=").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let (status, body) = get_json(test_app().await, "/api/summary").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["total_transactions"], 2);
        assert_eq!(data["by_type"][0]["category"], "incoming");
        assert_eq!(data["by_type"][0]["total_amount"], 5000.0);
        assert_eq!(data["monthly"][0]["month"], "2024-05");
        assert_eq!(data["monthly"][0]["count"], 2);
        assert_eq!(data["recent"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_types() {
        let (_, body) = get_json(test_app().await, "/api/types").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let (status, body) = get(test_app().await, "/?type=incoming").await;
        assert_eq!(status, StatusCode::OK);

        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Incoming Money"));
        assert!(html.contains("5,000 RWF"));
        assert!(html.contains("John Doe (0788123456)"));
    }
}
