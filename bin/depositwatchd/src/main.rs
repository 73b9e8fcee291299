use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use depositwatch_config::Config;
use depositwatch_kv::{KvStore, RestKvStore};
use depositwatch_walletrpc::WalletRpcClient;
use depositwatch_watcher::{spawn_tickers, WatcherMetrics};
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "depositwatchd", about = "Zano/FUSD deposit watcher and settlement daemon")]
struct Cli {
    /// Path to a TOML config file. Overridden by DEPOSITWATCH_* env vars.
    #[arg(long, env = "DEPOSITWATCH_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(Config::load(cli.config.as_deref())?);

    // Held for the process lifetime: dropping it flushes the non-blocking
    // file appender's buffer.
    let _log_guard = depositwatch_config::init_tracing(&config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Arc<Config>) -> eyre::Result<()> {
    info!(tickers = ?config.tickers, bind = %config.http_bind_addr, "depositwatchd starting");

    let kv_base_url = config.require_kv_base_url()?;
    let kv: Arc<dyn KvStore> = Arc::new(RestKvStore::new(url::Url::parse(kv_base_url)?, config.kv_token.clone()));

    let wallet_rpc_url = config.require_wallet_rpc_url()?;
    let basic_auth = config.wallet_rpc_user.clone().zip(config.wallet_rpc_password.clone());
    let wallet = Arc::new(WalletRpcClient::new(wallet_rpc_url, basic_auth));

    let http = reqwest::Client::new();
    let metrics = WatcherMetrics::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let ticker_tasks = spawn_tickers(config.clone(), kv.clone(), wallet.clone(), http, metrics, shutdown_rx);

    let api_state = depositwatch_api::ApiState::new(config.clone(), kv, wallet);
    let router = depositwatch_api::router(api_state);
    let listener = tokio::net::TcpListener::bind(config.http_bind_addr.as_str()).await?;
    info!(bind = %config.http_bind_addr, "intake surface listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown_signal());
    server.await?;

    info!("shutdown signal received, stopping ticker watchers");
    let _ = shutdown_tx.send(true);
    for task in ticker_tasks {
        let _ = task.await;
    }

    info!("depositwatchd stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
