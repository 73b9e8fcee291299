//! The Intake Surface: `POST /api/transaction/create`, `GET
//! /api/transaction/status/:ticker/:paymentId`, `POST
//! /api/transaction/callback/:ticker`, and `GET /health`.

mod auth;
mod cache;
mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use state::ApiState;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Builds the full router. The binary is responsible for binding it to a
/// listener and driving graceful shutdown.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/transaction/create", post(handlers::create))
        .route("/api/transaction/status/:ticker/:payment_id", get(handlers::status))
        .route("/api/transaction/callback/:ticker", post(handlers::callback))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use depositwatch_config::Config;
    use depositwatch_kv::MemoryKvStore;
    use depositwatch_walletrpc::WalletRpcClient;
    use tower::ServiceExt;

    use super::*;

    fn test_state(config: Config) -> ApiState {
        let kv: Arc<dyn depositwatch_kv::KvStore> = Arc::new(MemoryKvStore::new());
        let wallet = Arc::new(WalletRpcClient::new("http://127.0.0.1:1", None));
        ApiState::new(Arc::new(config), kv, wallet)
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = router(test_state(Config::default()));
        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn status_is_404_when_absent() {
        let app = router(test_state(Config::default()));
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/transaction/status/zano/missing")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_without_api_key_configured_is_service_unavailable() {
        let app = router(test_state(Config::default()));
        let body = serde_json::json!({"ticker": "zano", "clientReference": "r1"});
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/transaction/create")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn create_rejects_disabled_ticker_even_with_key() {
        let mut config = Config::default();
        config.api_key = Some("k1".to_string());
        let app = router(test_state(config));
        let body = serde_json::json!({"ticker": "zano", "clientReference": "r1"});
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/transaction/create")
                    .header("content-type", "application/json")
                    .header("X-Api-Key", "k1")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
