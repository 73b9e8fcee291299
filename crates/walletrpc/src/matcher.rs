use std::time::Duration;

use crate::{
    client::WalletRpcClient,
    error::RpcError,
    observation::{dedup_by_hash, observations_from_payments, observations_from_transfers, DepositObservation},
};

/// Runs the Matcher algorithm for one Job: `get_payments` for base-coin
/// tickers, `get_recent_txs_and_info2` for asset tickers or when
/// `get_payments` comes back empty, then dedup by hash.
pub async fn match_deposits(
    client: &WalletRpcClient,
    payment_id: &str,
    expected_asset_id: Option<&str>,
    current_height: u64,
    recent_txs_count: u64,
    timeout: Duration,
) -> Result<Vec<DepositObservation>, RpcError> {
    let mut observations = Vec::new();

    if expected_asset_id.is_none() {
        let result = client.get_payments(payment_id, timeout).await?;
        observations = observations_from_payments(&result, current_height);
    }

    if observations.is_empty() {
        let result = client
            .get_recent_txs_and_info2(0, recent_txs_count, true, false, "DESC", false, timeout)
            .await?;
        observations = observations_from_transfers(&result, payment_id, expected_asset_id, current_height);
    }

    Ok(dedup_by_hash(observations))
}

/// The single best observation for a Job: highest confirmations, ties
/// broken by hash for determinism.
pub fn best_observation(observations: &[DepositObservation]) -> Option<&DepositObservation> {
    observations.iter().max_by(|a, b| a.confirmations.cmp(&b.confirmations).then_with(|| a.hash.cmp(&b.hash)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn falls_back_to_recent_txs_when_payments_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(|req: &wiremock::Request| {
                let body: serde_json::Value = req.body_json().unwrap();
                let method = body["method"].as_str().unwrap();
                let result = match method {
                    "get_payments" => serde_json::json!({"payments": []}),
                    "get_recent_txs_and_info2" => serde_json::json!({
                        "transfers": [{
                            "payment_id": "pid1",
                            "tx_hash": "H",
                            "height": 100,
                            "subtransfers": [{"is_income": true, "amount": "500", "asset_id": ""}],
                        }]
                    }),
                    _ => panic!("unexpected method {method}"),
                };
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": result,
                }))
            })
            .mount(&server)
            .await;

        let client = WalletRpcClient::new(server.uri(), None);
        let observations = match_deposits(&client, "pid1", None, 102, 100, Duration::from_secs(8)).await.unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].hash, "H");
    }

    #[test]
    fn best_observation_picks_highest_confirmations() {
        use depositwatch_primitives::U256;
        let observations = vec![
            DepositObservation { hash: "A".into(), amount_atomic: U256::from(1u64), confirmations: 1 },
            DepositObservation { hash: "B".into(), amount_atomic: U256::from(1u64), confirmations: 5 },
        ];
        assert_eq!(best_observation(&observations).unwrap().hash, "B");
    }
}
