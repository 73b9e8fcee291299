use std::time::Duration;

use axum::{extract::State, http::HeaderMap, Json};
use depositwatch_store::{create_job, job_key, write_status, JobRecord, StatusRecord};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{require_header_secret, API_KEY_HEADER},
    error::ApiError,
    state::ApiState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub ticker: String,
    pub client_reference: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub expected_amount: Option<String>,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub ok: bool,
    pub job_key: String,
    pub status: &'static str,
    pub address: String,
    pub payment_id: String,
    pub expires_at: i64,
    pub ttl_seconds: u64,
}

pub async fn create(State(state): State<ApiState>, headers: HeaderMap, Json(req): Json<CreateRequest>) -> Result<Json<CreateResponse>, ApiError> {
    require_header_secret(&headers, API_KEY_HEADER, state.config.api_key.as_deref(), "apiKey")?;

    if req.client_reference.trim().is_empty() {
        return Err(ApiError::Validation("clientReference is required".to_string()));
    }
    if !state.config.is_ticker_enabled(&req.ticker) {
        return Err(ApiError::Validation(format!("ticker {} is not enabled", req.ticker)));
    }
    let ticker_cfg = state
        .config
        .ticker_configs
        .get(&req.ticker)
        .ok_or_else(|| ApiError::Validation(format!("ticker {} has no configuration", req.ticker)))?;

    let (address, payment_id) = match req.address {
        Some(address) => {
            let payment_id = req.payment_id.ok_or_else(|| ApiError::Validation("paymentId is required when address is provided".to_string()))?;
            (address, payment_id)
        }
        None => {
            state.config.require_wallet_rpc_url()?;
            let wallet_call_timeout = state.config.webhook_timeout.max(Duration::from_secs(8));
            let generated = state.wallet.make_integrated_address(req.payment_id.as_deref(), wallet_call_timeout).await?;
            (generated.integrated_address, generated.payment_id)
        }
    };

    let ttl_seconds = req.ttl_seconds.unwrap_or(state.config.job_ttl_seconds);
    let created_at = now_millis();

    let mut job = JobRecord::new(&req.ticker, &address, &payment_id, ticker_cfg.min_confirmations, created_at);
    job.expected_amount = req.expected_amount;
    job.client_reference = Some(req.client_reference);

    create_job(&*state.kv, &state.store_cfg, &job).await?;
    if req.ttl_seconds.is_some() {
        state.kv.expire(&job_key(&state.store_cfg.prefix, &req.ticker, &payment_id), ttl_seconds).await.map_err(depositwatch_store::StoreError::from)?;
    }

    let status = StatusRecord::pending(&req.ticker, &address, &payment_id, ticker_cfg.min_confirmations, created_at);
    write_status(&*state.kv, &state.store_cfg, &req.ticker, &payment_id, &status).await?;

    Ok(Json(CreateResponse {
        ok: true,
        job_key: job_key(&state.store_cfg.prefix, &req.ticker, &payment_id),
        status: "PENDING",
        address,
        payment_id,
        expires_at: created_at + ttl_seconds as i64 * 1000,
        ttl_seconds,
    }))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
