use std::{sync::Arc, time::Duration};

use depositwatch_config::Config;
use depositwatch_kv::KvStore;
use depositwatch_store::StoreConfig;
use depositwatch_walletrpc::WalletRpcClient;
use tokio::time::Instant;

use crate::cache::StatusCache;

/// Shared state for every Intake Surface handler, built once at process
/// start-up and cloned cheaply into each request (everything here is an
/// `Arc` or `Copy`).
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub kv: Arc<dyn KvStore>,
    pub store_cfg: StoreConfig,
    pub wallet: Arc<WalletRpcClient>,
    pub status_cache: Arc<StatusCache>,
    started_at: Instant,
}

impl ApiState {
    pub fn new(config: Arc<Config>, kv: Arc<dyn KvStore>, wallet: Arc<WalletRpcClient>) -> Self {
        let store_cfg = StoreConfig {
            prefix: config.key_prefix.clone(),
            job_ttl_seconds: config.job_ttl_seconds,
            status_ttl_seconds: config.status_ttl_seconds,
            seen_ttl_seconds: config.seen_ttl_seconds,
            ledger_ttl_seconds: config.deposit_ledger_ttl_seconds,
        };
        let status_cache = Arc::new(StatusCache::new(Duration::from_millis(config.status_cache_ttl_ms)));
        Self { config, kv, store_cfg, wallet, status_cache, started_at: Instant::now() }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
