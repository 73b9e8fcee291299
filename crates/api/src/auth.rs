use axum::http::HeaderMap;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const CALLBACK_SECRET_HEADER: &str = "X-Zano-Callback-Secret";

/// Checks a shared-secret header against a configured value. `NotConfigured`
/// if the operator never set the secret (the endpoint can't be gated at
/// all, so it's treated as unavailable rather than silently open);
/// `Unauthorized` if the header is absent or doesn't match.
pub fn require_header_secret(headers: &HeaderMap, header_name: &str, configured: Option<&str>, field: &'static str) -> Result<(), ApiError> {
    let configured = configured.ok_or(ApiError::NotConfigured(field))?;
    let provided = headers.get(header_name).and_then(|v| v.to_str().ok());
    match provided {
        Some(value) if value == configured => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}
