use std::collections::HashMap;

use serde::Deserialize;

use crate::ticker::TickerConfig;

/// Mirrors [`crate::Config`] with every field optional, for merging a TOML
/// file on top of built-in defaults. Never constructed by application code
/// directly.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub key_prefix: Option<String>,
    pub tickers: Option<Vec<String>>,
    pub ticker_configs: Option<HashMap<String, TickerConfig>>,

    #[serde(with = "humantime_serde::option", default)]
    pub interval: Option<std::time::Duration>,
    pub scan_count: Option<u32>,
    #[serde(with = "humantime_serde::option", default)]
    pub error_backoff: Option<std::time::Duration>,

    pub kv_base_url: Option<String>,
    pub kv_token: Option<String>,

    pub wallet_rpc_url: Option<String>,
    pub wallet_rpc_user: Option<String>,
    pub wallet_rpc_password: Option<String>,
    pub recent_txs_count: Option<u64>,

    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    #[serde(with = "humantime_serde::option", default)]
    pub webhook_timeout: Option<std::time::Duration>,
    pub webhook_backoff_base_ms: Option<u64>,
    pub webhook_backoff_factor: Option<f64>,
    pub webhook_backoff_max_ms: Option<u64>,
    pub webhook_backoff_jitter: Option<bool>,
    pub webhook_max_attempts: Option<u32>,
    #[serde(with = "humantime_serde::option", default)]
    pub webhook_max_retry_window: Option<std::time::Duration>,

    pub seen_ttl_seconds: Option<u64>,
    pub job_ttl_seconds: Option<u64>,
    pub status_ttl_seconds: Option<u64>,

    pub deposit_ledger_mode: Option<String>,
    pub deposit_ledger_dir: Option<String>,
    pub deposit_ledger_ttl_seconds: Option<u64>,

    pub log_level: Option<String>,
    pub log_error_file: Option<String>,

    pub api_key: Option<String>,
    pub callback_secret: Option<String>,
    pub http_bind_addr: Option<String>,
    pub status_cache_ttl_ms: Option<u64>,
}
