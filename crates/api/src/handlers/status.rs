use axum::extract::{Path, State};
use axum::Json;
use depositwatch_store::{load_status, StatusRecord};

use crate::{error::ApiError, state::ApiState};

pub async fn status(State(state): State<ApiState>, Path((ticker, payment_id)): Path<(String, String)>) -> Result<Json<StatusRecord>, ApiError> {
    if let Some(cached) = state.status_cache.get(&ticker, &payment_id) {
        return Ok(Json(cached));
    }

    let record = load_status(&*state.kv, &state.store_cfg, &ticker, &payment_id).await?.ok_or(ApiError::NotFound)?;
    state.status_cache.put(&ticker, &payment_id, record.clone());
    Ok(Json(record))
}
