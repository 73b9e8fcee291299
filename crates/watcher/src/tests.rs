use std::{sync::Arc, time::Duration};

use depositwatch_config::{ConsolidationConfig, TickerConfig};
use depositwatch_kv::MemoryKvStore;
use depositwatch_store::{load_job, load_status, JobRecord, JobStatus, StoreConfig};
use depositwatch_walletrpc::WalletRpcClient;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

use crate::{context::JobContext, state_machine::run_job};

fn base_ticker_cfg() -> TickerConfig {
    TickerConfig { decimals: 12, min_confirmations: 1, asset_id: None, consolidation: ConsolidationConfig::default(), webhook_url: None }
}

/// `amount_units` is whole coins (scaled here by `10^12`), chosen per test to
/// land on one side or the other of the dynamic confirmation policy's 50/100
/// unit breakpoints.
async fn wallet_server(payment_id: &str, hash: &str, amount_units: u64, block_height: u64) -> MockServer {
    let server = MockServer::start().await;
    let payment_id = payment_id.to_string();
    let hash = hash.to_string();
    let amount_atomic = (amount_units as u128 * 1_000_000_000_000u128).to_string();
    Mock::given(method("POST"))
        .respond_with(move |req: &wiremock::Request| {
            let body: serde_json::Value = req.body_json().unwrap();
            let method = body["method"].as_str().unwrap();
            let result = match method {
                "get_payments" => serde_json::json!({
                    "payments": [{ "payment_id": payment_id, "tx_hash": hash, "amount": amount_atomic, "block_height": block_height }]
                }),
                "get_recent_txs_and_info2" => serde_json::json!({ "transfers": [] }),
                other => panic!("unexpected method {other}"),
            };
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "jsonrpc": "2.0", "id": body["id"], "result": result }))
        })
        .mount(&server)
        .await;
    server
}

fn ctx(kv: Arc<MemoryKvStore>, wallet: Arc<WalletRpcClient>, webhook_url: String, current_height: u64, now_ms: i64) -> JobContext {
    let mut ticker_cfg = base_ticker_cfg();
    ticker_cfg.webhook_url = Some(webhook_url);
    JobContext {
        kv,
        store_cfg: StoreConfig::default(),
        wallet,
        http: reqwest::Client::new(),
        metrics: crate::metrics::WatcherMetrics::new(),
        ticker: "zano".to_string(),
        ticker_cfg,
        webhook_secret: "s3cret".to_string(),
        webhook_timeout: Duration::from_secs(5),
        backoff: depositwatch_webhook::BackoffPolicy { base_ms: 1000, factor: 2.0, max_ms: 20 * 60 * 1000, jitter: false },
        webhook_max_attempts: 0,
        webhook_max_retry_window_ms: 2 * 3600 * 1000,
        recent_txs_count: 50,
        wallet_call_timeout: Duration::from_secs(8),
        current_height,
        now_ms,
    }
}

#[tokio::test]
async fn happy_path_completes_and_cleans_up() {
    // 10 units keeps the dynamic policy at 1 confirmation (below the 50 breakpoint).
    let wallet = wallet_server("pid1", "HASH1", 10, 100).await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&webhook).await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));
    let ctx = ctx(kv.clone(), rpc, webhook.uri(), 101, 1_000_000);

    let job = JobRecord::new("zano", "addrA", "pid1", 1, 900_000);
    depositwatch_store::create_job(&*ctx.kv, &ctx.store_cfg, &job).await.unwrap();

    run_job(&ctx, "pid1").await.unwrap();

    assert!(load_job(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().is_none());
    let status = load_status(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert!(depositwatch_store::is_seen(&*ctx.kv, &ctx.store_cfg, "HASH1").await.unwrap());
}

#[tokio::test]
async fn webhook_failure_schedules_a_backoff_retry() {
    let wallet = wallet_server("pid1", "HASH1", 10, 100).await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&webhook).await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));
    let ctx = ctx(kv.clone(), rpc, webhook.uri(), 101, 1_000_000);

    let job = JobRecord::new("zano", "addrA", "pid1", 1, 900_000);
    depositwatch_store::create_job(&*ctx.kv, &ctx.store_cfg, &job).await.unwrap();

    run_job(&ctx, "pid1").await.unwrap();

    let remaining = load_job(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(remaining.webhook_attempts, 1);
    // base_ms=1000, factor=2.0, no jitter: delay_ms(0) == 1000 (first failure).
    assert_eq!(remaining.webhook_next_attempt_at, Some(1_000_000 + 1000));
    assert!(!remaining.webhook_sent);
}

#[tokio::test]
async fn retry_window_expiry_marks_failed_and_deletes() {
    let wallet = wallet_server("pid1", "HASH1", 10, 100).await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&webhook).await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));
    let now_ms: i64 = 1_000_000_000;
    let ctx = ctx(kv.clone(), rpc, webhook.uri(), 101, now_ms);

    let mut job = JobRecord::new("zano", "addrA", "pid1", 1, now_ms - 3 * 3600 * 1000);
    job.dynamic_min_conf_applied = true;
    job.webhook_attempts = 2;
    job.webhook_first_attempt_at = Some(now_ms - 3 * 3600 * 1000);
    job.webhook_next_attempt_at = Some(now_ms - 1000);
    depositwatch_store::create_job(&*ctx.kv, &ctx.store_cfg, &job).await.unwrap();

    run_job(&ctx, "pid1").await.unwrap();

    assert!(load_job(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().is_none());
    let status = load_status(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(status.status, JobStatus::Failed);
    assert!(depositwatch_store::is_seen(&*ctx.kv, &ctx.store_cfg, "HASH1").await.unwrap());
}

#[tokio::test]
async fn already_dispatched_job_is_idempotent_on_restart() {
    let wallet = wallet_server("pid1", "HASH1", 10, 100).await;
    // No webhook mock mounted: a second dispatch attempt would error out the test.
    let webhook = MockServer::start().await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));
    let ctx = ctx(kv.clone(), rpc, webhook.uri(), 101, 1_000_000);

    let mut job = JobRecord::new("zano", "addrA", "pid1", 1, 900_000);
    job.dynamic_min_conf_applied = true;
    job.webhook_sent = true;
    depositwatch_store::create_job(&*ctx.kv, &ctx.store_cfg, &job).await.unwrap();

    run_job(&ctx, "pid1").await.unwrap();

    assert!(load_job(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().is_none());
    assert!(depositwatch_store::is_seen(&*ctx.kv, &ctx.store_cfg, "HASH1").await.unwrap());
}

#[tokio::test]
async fn below_threshold_refreshes_confirming_without_dispatch() {
    // 60 units lands the dynamic policy at 3 confirmations; one mined block isn't enough.
    let wallet = wallet_server("pid1", "HASH1", 60, 100).await;
    let webhook = MockServer::start().await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));
    let ctx = ctx(kv.clone(), rpc, webhook.uri(), 100, 1_000_000);

    let job = JobRecord::new("zano", "addrA", "pid1", 1, 900_000);
    depositwatch_store::create_job(&*ctx.kv, &ctx.store_cfg, &job).await.unwrap();

    run_job(&ctx, "pid1").await.unwrap();

    let remaining = load_job(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert!(!remaining.webhook_sent);
    assert_eq!(remaining.min_conf, 3);
    let status = load_status(&*ctx.kv, &ctx.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(status.status, JobStatus::Confirming);
    assert_eq!(status.confirmations, 1);
}

#[tokio::test]
async fn dynamic_min_conf_applies_exactly_once() {
    // First pass below threshold latches min_conf=3; a later pass with more
    // confirmations must not re-derive it even though the amount is unchanged.
    let wallet = wallet_server("pid1", "HASH1", 60, 100).await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&webhook).await;

    let kv = Arc::new(MemoryKvStore::new());
    let rpc = Arc::new(WalletRpcClient::new(wallet.uri(), None));

    let job = JobRecord::new("zano", "addrA", "pid1", 1, 900_000);
    let ctx1 = ctx(kv.clone(), rpc.clone(), webhook.uri(), 100, 1_000_000);
    depositwatch_store::create_job(&*ctx1.kv, &ctx1.store_cfg, &job).await.unwrap();
    run_job(&ctx1, "pid1").await.unwrap();

    let after_first = load_job(&*ctx1.kv, &ctx1.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(after_first.min_conf, 3);
    assert!(after_first.dynamic_min_conf_applied);

    let ctx2 = ctx(kv.clone(), rpc, webhook.uri(), 102, 1_000_100);
    run_job(&ctx2, "pid1").await.unwrap();

    assert!(load_job(&*ctx2.kv, &ctx2.store_cfg, "zano", "pid1").await.unwrap().is_none());
    let status = load_status(&*ctx2.kv, &ctx2.store_cfg, "zano", "pid1").await.unwrap().unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.required_confirmations, 3);
}
