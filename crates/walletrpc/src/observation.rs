use depositwatch_primitives::U256;
use serde_json::Value;

use crate::client::confirmations_from_height;

/// A single observed deposit, already normalized out of whatever field
/// names and nesting shape the wallet daemon happened to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositObservation {
    pub hash: String,
    pub amount_atomic: U256,
    pub confirmations: u32,
}

const HASH_KEYS: &[&str] = &["hash", "tx_hash", "txHash", "txid", "transactionHash"];
const AMOUNT_KEYS: &[&str] = &["amountAtomic", "amount_atomic", "amount", "value"];
const CONFIRMATIONS_KEYS: &[&str] = &["confirmations", "conf", "num_confirmations", "confirmations_count", "confirmed"];
const ARRAY_KEYS: &[&str] = &["deposits", "transactions", "items", "entries", "in", "transfers"];

fn lookup_str<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| entry.get(k)).and_then(Value::as_str)
}

fn lookup_u64(entry: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| entry.get(k)).and_then(|v| {
        v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    })
}

fn lookup_amount(entry: &Value) -> Option<U256> {
    AMOUNT_KEYS.iter().find_map(|k| entry.get(k)).and_then(|v| {
        if let Some(s) = v.as_str() {
            U256::from_str_radix(s, 10).ok()
        } else if let Some(n) = v.as_u64() {
            Some(U256::from(n))
        } else {
            None
        }
    })
}

/// Flattens a JSON-RPC `result` payload into the list of per-deposit entries
/// it nests its array under, trying candidate keys in priority order, and
/// falling back to the value itself if it is already an array.
pub fn flatten_entries(result: &Value) -> Vec<&Value> {
    if let Some(array) = result.as_array() {
        return array.iter().collect();
    }
    for key in ARRAY_KEYS {
        if let Some(array) = result.get(key).and_then(Value::as_array) {
            return array.iter().collect();
        }
    }
    Vec::new()
}

/// Normalizes a `get_payments` result into observations, given the current
/// chain height (for converting `block_height` into confirmations). An
/// entry missing a recognizable hash or amount is skipped and logged by the
/// caller, never causing the whole batch to fail.
pub fn observations_from_payments(result: &Value, current_height: u64) -> Vec<DepositObservation> {
    flatten_entries(result)
        .into_iter()
        .filter_map(|entry| {
            let hash = lookup_str(entry, HASH_KEYS)?.to_string();
            let amount_atomic = lookup_amount(entry)?;
            let confirmations = match lookup_u64(entry, &["block_height", "blockHeight"]) {
                Some(height) if height > 0 => confirmations_from_height(current_height, height),
                _ => lookup_u64(entry, CONFIRMATIONS_KEYS).unwrap_or(0) as u32,
            };
            Some(DepositObservation { hash, amount_atomic, confirmations })
        })
        .collect()
}

/// Normalizes a `get_recent_txs_and_info2` result: filters each transfer's
/// `subtransfers` by `payment_id`, `is_income`, and asset id (the expected
/// asset id in asset mode, or an empty asset id for the base-coin
/// fallback).
pub fn observations_from_transfers(result: &Value, payment_id: &str, expected_asset_id: Option<&str>, current_height: u64) -> Vec<DepositObservation> {
    let transfers = result.get("transfers").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

    transfers
        .iter()
        .filter(|transfer| lookup_str(transfer, &["payment_id", "paymentId"]) == Some(payment_id))
        .filter_map(|transfer| {
            let hash = lookup_str(transfer, HASH_KEYS)?.to_string();
            let height = lookup_u64(transfer, &["height", "block_height"]).unwrap_or(0);
            let confirmations = if height > 0 { confirmations_from_height(current_height, height) } else { 0 };

            let subtransfers = transfer.get("subtransfers").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
            let best = subtransfers.iter().find(|sub| {
                let is_income = sub.get("is_income").and_then(Value::as_bool).unwrap_or(false);
                if !is_income {
                    return false;
                }
                let asset_id = sub.get("asset_id").and_then(Value::as_str).unwrap_or("");
                match expected_asset_id {
                    Some(expected) => asset_id == expected,
                    None => asset_id.is_empty(),
                }
            })?;

            let amount_atomic = lookup_amount(best)?;
            Some(DepositObservation { hash, amount_atomic, confirmations })
        })
        .collect()
}

/// Deduplicates observations by hash, keeping the one with the highest
/// confirmation count.
pub fn dedup_by_hash(observations: Vec<DepositObservation>) -> Vec<DepositObservation> {
    let mut by_hash: std::collections::HashMap<String, DepositObservation> = std::collections::HashMap::new();
    for obs in observations {
        by_hash
            .entry(obs.hash.clone())
            .and_modify(|existing| {
                if obs.confirmations > existing.confirmations {
                    *existing = obs.clone();
                }
            })
            .or_insert(obs);
    }
    by_hash.into_values().collect()
}
