use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::ApiState;

pub async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({ "status": "healthy", "uptime": state.uptime_seconds() }))
}
