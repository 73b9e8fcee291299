use std::time::Duration;

use depositwatch_primitives::U256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::RpcError;

/// Minimum per-call timeout regardless of what a caller requests, matching
/// the spec's floor of 8s for wallet calls.
const MIN_TIMEOUT: Duration = Duration::from_secs(8);

pub struct WalletRpcClient {
    http: reqwest::Client,
    endpoint: String,
    basic_auth: Option<(String, String)>,
    next_id: std::sync::atomic::AtomicU64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletInfo {
    #[serde(default)]
    pub current_height: u64,
    #[serde(default)]
    pub daemon_height: u64,
    #[serde(default)]
    pub is_synchronized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferDestination {
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferResult {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntegratedAddress {
    pub integrated_address: String,
    pub payment_id: String,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

impl WalletRpcClient {
    pub fn new(endpoint: impl Into<String>, basic_auth: Option<(String, String)>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            basic_auth,
            next_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P, timeout: Duration) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let body = JsonRpcRequest { jsonrpc: "2.0", id, method, params };
        let timeout = timeout.max(MIN_TIMEOUT);

        let mut req = self.http.post(&self.endpoint).timeout(timeout).json(&body);
        if let Some((user, pass)) = &self.basic_auth {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.as_u16() >= 400 {
            let message = resp.text().await.unwrap_or_default();
            return Err(RpcError::Http { status: status.as_u16(), message });
        }

        let raw: Value = resp.json().await.map_err(RpcError::Transport)?;
        let parsed: JsonRpcResponse<R> =
            serde_json::from_value(raw).map_err(|err| RpcError::Decode(err.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(RpcError::JsonRpc { code: error.code, message: error.message });
        }
        parsed.result.ok_or_else(|| RpcError::Decode("missing result field".to_string()))
    }

    pub async fn get_wallet_info(&self, timeout: Duration) -> Result<WalletInfo, RpcError> {
        self.call("get_wallet_info", json!({}), timeout).await
    }

    /// Returns the raw `result` object. The wallet's idea of where the
    /// payments array lives varies by version and deployment, so decoding
    /// is left to [`crate::observation`]'s shape normalizer rather than a
    /// fixed struct here.
    pub async fn get_payments(&self, payment_id: &str, timeout: Duration) -> Result<Value, RpcError> {
        self.call("get_payments", json!({ "payment_id": payment_id }), timeout).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn get_recent_txs_and_info2(
        &self,
        offset: u64,
        count: u64,
        exclude_mining: bool,
        exclude_unconfirmed: bool,
        order: &str,
        update_provision_info: bool,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        self.call(
            "get_recent_txs_and_info2",
            json!({
                "offset": offset,
                "count": count,
                "exclude_mining": exclude_mining,
                "exclude_unconfirmed": exclude_unconfirmed,
                "order": order,
                "update_provision_info": update_provision_info,
            }),
            timeout,
        )
        .await
    }

    pub async fn transfer(
        &self,
        destinations: &[TransferDestination],
        fee: &str,
        mixin: u32,
        unlock_time: u64,
        do_not_relay: bool,
        priority: u32,
        timeout: Duration,
    ) -> Result<TransferResult, RpcError> {
        self.call(
            "transfer",
            json!({
                "destinations": destinations,
                "fee": fee,
                "mixin": mixin,
                "unlock_time": unlock_time,
                "do_not_relay": do_not_relay,
                "priority": priority,
            }),
            timeout,
        )
        .await
    }

    pub async fn make_integrated_address(&self, payment_id: Option<&str>, timeout: Duration) -> Result<IntegratedAddress, RpcError> {
        self.call("make_integrated_address", json!({ "payment_id": payment_id }), timeout).await
    }
}

/// `current_height - block_height + 1`, inclusive of the mined block, and
/// never negative.
pub fn confirmations_from_height(current_height: u64, block_height: u64) -> u32 {
    if current_height == 0 || block_height == 0 || block_height > current_height {
        return 0;
    }
    ((current_height - block_height) + 1).min(u32::MAX as u64) as u32
}

pub fn parse_amount_atomic(raw: &str) -> Option<U256> {
    U256::from_str_radix(raw, 10).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmations_inclusive_of_mined_block() {
        assert_eq!(confirmations_from_height(102, 100), 3);
        assert_eq!(confirmations_from_height(100, 100), 1);
    }

    #[test]
    fn confirmations_zero_when_unknown_or_future() {
        assert_eq!(confirmations_from_height(0, 100), 0);
        assert_eq!(confirmations_from_height(100, 0), 0);
        assert_eq!(confirmations_from_height(100, 150), 0);
    }

    #[tokio::test]
    async fn call_surfaces_json_rpc_error() {
        use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "method not found"}
            })))
            .mount(&server)
            .await;

        let client = WalletRpcClient::new(server.uri(), None);
        let err = client.get_wallet_info(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, RpcError::JsonRpc { code: -32601, .. }));
    }
}
