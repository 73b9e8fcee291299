use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use depositwatch_primitives::{format_atomic, U256};
use depositwatch_store::{delete_job, mark_seen, write_status, JobStatus, StatusRecord};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{require_header_secret, CALLBACK_SECRET_HEADER},
    error::ApiError,
    state::ApiState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub payment_id: String,
    pub address: String,
    #[serde(default)]
    pub amount: Option<String>,
    pub amount_atomic: String,
    #[serde(default)]
    pub expected_amount: Option<String>,
    pub confirmations: u32,
    pub hash: String,
    #[serde(default)]
    pub client_reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub ok: bool,
    pub status: &'static str,
}

/// Lets an external status API post an already-confirmed deposit directly,
/// bypassing the watcher's own Matcher. Writes the same canonical fields the
/// State Machine would at its own completion step, marks Seen so the
/// watcher never re-fires a webhook for the same hash, and drops any Job
/// still pending for this `paymentId`.
pub async fn callback(
    State(state): State<ApiState>,
    Path(ticker): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    require_header_secret(&headers, CALLBACK_SECRET_HEADER, state.config.callback_secret.as_deref(), "callbackSecret")?;

    let amount_atomic = U256::from_str_radix(&req.amount_atomic, 10)
        .map_err(|_| ApiError::Validation("amountAtomic is not a valid integer".to_string()))?;
    let decimals = state.config.ticker_configs.get(&ticker).map(|t| t.decimals).unwrap_or(0);
    let paid_amount = req.amount.unwrap_or_else(|| format_atomic(amount_atomic, decimals));
    let created_at = req.created_at.unwrap_or_else(now_millis);

    let status = StatusRecord {
        status: JobStatus::Completed,
        ticker: ticker.clone(),
        address: req.address,
        payment_id: req.payment_id.clone(),
        client_reference: req.client_reference,
        confirmations: req.confirmations,
        required_confirmations: req.confirmations,
        hash: Some(req.hash.clone()),
        paid_amount: Some(paid_amount.clone()),
        paid_amount_atomic: Some(amount_atomic.to_string()),
        effective_amount: Some(paid_amount),
        effective_amount_atomic: Some(amount_atomic.to_string()),
        fee_atomic: None,
        created_at,
        updated_at: now_millis(),
        webhook_error: None,
    };
    write_status(&*state.kv, &state.store_cfg, &ticker, &req.payment_id, &status).await?;
    mark_seen(&*state.kv, &state.store_cfg, &req.hash).await?;
    delete_job(&*state.kv, &state.store_cfg, &ticker, &req.payment_id).await?;

    Ok(Json(CallbackResponse { ok: true, status: "COMPLETED" }))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
