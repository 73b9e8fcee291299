use serde::{de::DeserializeOwned, Serialize};

use crate::{error::KvError, store::KvStore};

/// Reads and parses a JSON-valued string key. A missing key or a parse
/// failure both surface as `Ok(None)` — this never returns an `Err` for a
/// malformed payload, only for a transport failure, so a corrupt record
/// never takes down a caller that can otherwise make progress from KV-truth
/// state.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, KvError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding malformed JSON value from kv store");
            Ok(None)
        }
    }
}

/// Serializes `value` and writes it as a string key, optionally with a TTL.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl_seconds: Option<u64>,
) -> Result<(), KvError> {
    let raw = serde_json::to_string(value)
        .map_err(|err| KvError::Rejected(format!("failed to encode value: {err}")))?;
    store.set(key, &raw, ttl_seconds).await
}
