use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Errors an Intake Surface handler can produce. Every variant maps to a
/// fixed HTTP status; handlers never need to pick one themselves.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("transaction not found")]
    NotFound,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Store(#[from] depositwatch_store::StoreError),

    #[error(transparent)]
    Rpc(#[from] depositwatch_walletrpc::RpcError),
}

impl From<depositwatch_config::ConfigError> for ApiError {
    fn from(err: depositwatch_config::ConfigError) -> Self {
        match err {
            depositwatch_config::ConfigError::NotConfigured(field) => Self::NotConfigured(field),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::Rpc(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
