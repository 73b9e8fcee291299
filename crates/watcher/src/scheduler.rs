use std::{sync::Arc, time::Duration};

use depositwatch_config::Config;
use depositwatch_kv::KvStore;
use depositwatch_store::{parse_job_key, scan_jobs, StoreConfig};
use depositwatch_walletrpc::WalletRpcClient;
use depositwatch_webhook::BackoffPolicy;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{context::JobContext, metrics::WatcherMetrics, state_machine::run_job};

/// Spawns one task per enabled ticker, each scanning and advancing its own
/// Jobs independently. A ticker that starts erroring backs off on its own;
/// it never blocks another ticker's progress.
pub fn spawn_tickers(
    config: Arc<Config>,
    kv: Arc<dyn KvStore>,
    wallet: Arc<WalletRpcClient>,
    http: reqwest::Client,
    metrics: WatcherMetrics,
    shutdown_rx: watch::Receiver<bool>,
) -> Vec<tokio::task::JoinHandle<()>> {
    config
        .tickers
        .iter()
        .cloned()
        .map(|ticker| {
            let config = config.clone();
            let kv = kv.clone();
            let wallet = wallet.clone();
            let http = http.clone();
            let metrics = metrics.clone();
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                run_ticker(config, kv, wallet, http, metrics, ticker, shutdown_rx).await;
            })
        })
        .collect()
}

async fn run_ticker(
    config: Arc<Config>,
    kv: Arc<dyn KvStore>,
    wallet: Arc<WalletRpcClient>,
    http: reqwest::Client,
    metrics: WatcherMetrics,
    ticker: String,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let Some(ticker_cfg) = config.ticker_configs.get(&ticker).cloned() else {
        error!(ticker = %ticker, "ticker listed but has no configuration, skipping");
        return;
    };

    info!(ticker = %ticker, interval_ms = config.interval.as_millis(), "ticker watcher started");

    let store_cfg = StoreConfig { prefix: config.key_prefix.clone(), job_ttl_seconds: config.job_ttl_seconds, status_ttl_seconds: config.status_ttl_seconds, seen_ttl_seconds: config.seen_ttl_seconds, ledger_ttl_seconds: config.deposit_ledger_ttl_seconds };
    let backoff = BackoffPolicy { base_ms: config.webhook_backoff_base_ms, factor: config.webhook_backoff_factor, max_ms: config.webhook_backoff_max_ms, jitter: config.webhook_backoff_jitter };
    let webhook_secret = config.webhook_secret.clone().unwrap_or_default();
    let webhook_url = config.webhook_url_for(&ticker).map(|u| u.to_string());
    let mut ticker_cfg = ticker_cfg;
    if ticker_cfg.webhook_url.is_none() {
        ticker_cfg.webhook_url = webhook_url;
    }

    let mut next_deadline = tokio::time::Instant::now();
    metrics.active_tickers.increment(1.0);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(ticker = %ticker, "ticker watcher stopping");
                    break;
                }
            }
            _ = tokio::time::sleep_until(next_deadline) => {
                let started = tokio::time::Instant::now();
                match run_scan_cycle(&config, &kv, &wallet, &http, &ticker, &ticker_cfg, &store_cfg, &backoff, &webhook_secret, &metrics).await {
                    Ok(()) => {
                        let elapsed = started.elapsed();
                        next_deadline = started + config.interval.max(elapsed).max(Duration::from_millis(1));
                    }
                    Err(err) => {
                        warn!(ticker = %ticker, error = %err, "scan cycle failed, backing off");
                        metrics.ticker_backoffs.increment(1);
                        next_deadline = tokio::time::Instant::now() + config.error_backoff;
                    }
                }
            }
        }
    }

    metrics.active_tickers.decrement(1.0);
}

#[allow(clippy::too_many_arguments)]
async fn run_scan_cycle(
    config: &Config,
    kv: &Arc<dyn KvStore>,
    wallet: &Arc<WalletRpcClient>,
    http: &reqwest::Client,
    ticker: &str,
    ticker_cfg: &depositwatch_config::TickerConfig,
    store_cfg: &StoreConfig,
    backoff: &BackoffPolicy,
    webhook_secret: &str,
    metrics: &WatcherMetrics,
) -> Result<(), crate::error::WatcherError> {
    let wallet_call_timeout = config.webhook_timeout.max(Duration::from_secs(8));
    let info = wallet.get_wallet_info(wallet_call_timeout).await?;
    let now_ms = now_millis();

    let ctx = JobContext {
        kv: kv.clone(),
        store_cfg: store_cfg.clone(),
        wallet: wallet.clone(),
        http: http.clone(),
        metrics: metrics.clone(),
        ticker: ticker.to_string(),
        ticker_cfg: ticker_cfg.clone(),
        webhook_secret: webhook_secret.to_string(),
        webhook_timeout: config.webhook_timeout,
        backoff: *backoff,
        webhook_max_attempts: config.webhook_max_attempts,
        webhook_max_retry_window_ms: config.webhook_max_retry_window.as_millis() as i64,
        recent_txs_count: config.recent_txs_count,
        wallet_call_timeout,
        current_height: info.current_height,
        now_ms,
    };

    let mut cursor = "0".to_string();
    loop {
        let (next_cursor, keys) = scan_jobs(&*ctx.kv, &ctx.store_cfg, ticker, config.scan_count, &cursor).await?;
        for key in keys {
            let Some((_, payment_id)) = parse_job_key(&ctx.store_cfg, &key) else {
                continue;
            };
            metrics.jobs_scanned.increment(1);
            if let Err(err) = run_job(&ctx, payment_id).await {
                if err.is_rpc() {
                    return Err(err);
                }
                metrics.jobs_failed.increment(1);
                warn!(ticker = %ticker, payment_id, error = %err, "job step failed, will retry next pass");
            }
        }
        cursor = next_cursor;
        if cursor == "0" {
            break;
        }
    }
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
