use std::{sync::Arc, time::Duration};

use depositwatch_config::TickerConfig;
use depositwatch_kv::KvStore;
use depositwatch_store::StoreConfig;
use depositwatch_walletrpc::WalletRpcClient;
use depositwatch_webhook::BackoffPolicy;

use crate::metrics::WatcherMetrics;

/// Everything one [`crate::state_machine::run_job`] invocation needs.
/// Built fresh per scheduling pass (`current_height`/`now_ms` change every
/// tick); the rest is cloned cheaply from the ticker's long-lived state.
#[derive(Clone)]
pub struct JobContext {
    pub kv: Arc<dyn KvStore>,
    pub store_cfg: StoreConfig,
    pub wallet: Arc<WalletRpcClient>,
    pub http: reqwest::Client,
    pub metrics: WatcherMetrics,

    pub ticker: String,
    pub ticker_cfg: TickerConfig,

    pub webhook_secret: String,
    pub webhook_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub webhook_max_attempts: u32,
    pub webhook_max_retry_window_ms: i64,

    pub recent_txs_count: u64,
    pub wallet_call_timeout: Duration,

    pub current_height: u64,
    pub now_ms: i64,
}
