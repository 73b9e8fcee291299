//! Immutable process configuration, built once at start-up from (in
//! increasing precedence) built-in defaults, an optional TOML file, and
//! `DEPOSITWATCH_*` environment variables. No other crate reads
//! `std::env` after this is constructed.

mod error;
mod logging;
mod raw;
mod ticker;

use std::{collections::HashMap, path::Path, time::Duration};

use serde::Deserialize;

pub use error::ConfigError;
pub use logging::init_tracing;
pub use ticker::{ConsolidationConfig, TickerConfig};

use raw::RawConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    Off,
    Kv,
    Disk,
}

/// Fully-resolved process configuration. Every field has a value; required
/// fields without a default (KV/wallet/webhook endpoints) are `Option` and
/// checked lazily with the `require_*` accessors so that read-only HTTP
/// endpoints can keep serving even when the watcher itself can't start.
#[derive(Debug, Clone)]
pub struct Config {
    pub key_prefix: String,
    pub tickers: Vec<String>,
    pub ticker_configs: HashMap<String, TickerConfig>,

    pub interval: Duration,
    pub scan_count: u32,
    pub error_backoff: Duration,

    pub kv_base_url: Option<String>,
    pub kv_token: Option<String>,

    pub wallet_rpc_url: Option<String>,
    pub wallet_rpc_user: Option<String>,
    pub wallet_rpc_password: Option<String>,
    pub recent_txs_count: u64,

    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_timeout: Duration,
    pub webhook_backoff_base_ms: u64,
    pub webhook_backoff_factor: f64,
    pub webhook_backoff_max_ms: u64,
    pub webhook_backoff_jitter: bool,
    pub webhook_max_attempts: u32,
    pub webhook_max_retry_window: Duration,

    pub seen_ttl_seconds: u64,
    pub job_ttl_seconds: u64,
    pub status_ttl_seconds: u64,

    pub deposit_ledger_mode: LedgerMode,
    pub deposit_ledger_dir: Option<String>,
    pub deposit_ledger_ttl_seconds: Option<u64>,

    pub log_level: LogLevel,
    pub log_error_file: Option<String>,

    pub api_key: Option<String>,
    pub callback_secret: Option<String>,
    pub http_bind_addr: String,
    pub status_cache_ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let interval = Duration::from_secs(15);
        Self {
            key_prefix: "zano".to_string(),
            tickers: Vec::new(),
            ticker_configs: HashMap::new(),

            interval,
            scan_count: 100,
            error_backoff: Duration::from_secs(30),

            kv_base_url: None,
            kv_token: None,

            wallet_rpc_url: None,
            wallet_rpc_user: None,
            wallet_rpc_password: None,
            recent_txs_count: 100,

            webhook_url: None,
            webhook_secret: None,
            webhook_timeout: Duration::from_secs(10),
            webhook_backoff_base_ms: 1000,
            webhook_backoff_factor: 2.0,
            webhook_backoff_max_ms: 20 * 60 * 1000,
            webhook_backoff_jitter: true,
            webhook_max_attempts: 0,
            webhook_max_retry_window: Duration::from_secs(2 * 3600),

            seen_ttl_seconds: 4 * 3600,
            job_ttl_seconds: 24 * 3600,
            status_ttl_seconds: 7 * 24 * 3600,

            deposit_ledger_mode: LedgerMode::Off,
            deposit_ledger_dir: None,
            deposit_ledger_ttl_seconds: None,

            log_level: LogLevel::Info,
            log_error_file: None,

            api_key: None,
            callback_secret: None,
            http_bind_addr: "0.0.0.0:8080".to_string(),
            status_cache_ttl_ms: 5000,
        }
    }
}

impl Config {
    /// Loads defaults, overlays an optional TOML file, then overlays
    /// `DEPOSITWATCH_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
            let raw: RawConfig = toml::from_str(&text)
                .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
            config.apply_raw(raw);
        }

        config.apply_env();

        // status cache TTL defaults to min(5s, intervalMs) unless overridden.
        if config.status_cache_ttl_ms == 5000 {
            config.status_cache_ttl_ms = config.status_cache_ttl_ms.min(config.interval.as_millis() as u64);
        }

        Ok(config)
    }

    fn apply_raw(&mut self, raw: RawConfig) {
        macro_rules! overlay {
            ($field:ident) => {
                if let Some(v) = raw.$field {
                    self.$field = v;
                }
            };
        }
        overlay!(key_prefix);
        overlay!(tickers);
        overlay!(ticker_configs);
        overlay!(interval);
        overlay!(scan_count);
        overlay!(error_backoff);
        overlay!(kv_base_url);
        overlay!(kv_token);
        overlay!(wallet_rpc_url);
        overlay!(wallet_rpc_user);
        overlay!(wallet_rpc_password);
        overlay!(recent_txs_count);
        overlay!(webhook_url);
        overlay!(webhook_secret);
        overlay!(webhook_timeout);
        overlay!(webhook_backoff_base_ms);
        overlay!(webhook_backoff_factor);
        overlay!(webhook_backoff_max_ms);
        overlay!(webhook_backoff_jitter);
        overlay!(webhook_max_attempts);
        overlay!(webhook_max_retry_window);
        overlay!(seen_ttl_seconds);
        overlay!(job_ttl_seconds);
        overlay!(status_ttl_seconds);
        overlay!(deposit_ledger_dir);
        overlay!(deposit_ledger_ttl_seconds);
        overlay!(log_error_file);
        overlay!(api_key);
        overlay!(callback_secret);
        overlay!(http_bind_addr);
        overlay!(status_cache_ttl_ms);

        if let Some(mode) = raw.deposit_ledger_mode.as_deref() {
            if let Some(parsed) = parse_ledger_mode(mode) {
                self.deposit_ledger_mode = parsed;
            }
        }
        if let Some(level) = raw.log_level.as_deref() {
            if let Some(parsed) = parse_log_level(level) {
                self.log_level = parsed;
            }
        }
    }

    fn apply_env(&mut self) {
        fn env(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }
        fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            env(name).and_then(|v| v.parse().ok())
        }

        if let Some(v) = env("DEPOSITWATCH_KEY_PREFIX") {
            self.key_prefix = v;
        }
        if let Some(v) = env_parsed::<u64>("DEPOSITWATCH_INTERVAL_MS") {
            self.interval = Duration::from_millis(v);
        }
        if let Some(v) = env_parsed("DEPOSITWATCH_SCAN_COUNT") {
            self.scan_count = v;
        }
        if let Some(v) = env_parsed::<u64>("DEPOSITWATCH_ERROR_BACKOFF_MS") {
            self.error_backoff = Duration::from_millis(v);
        }
        if let Some(v) = env("DEPOSITWATCH_KV_BASE_URL") {
            self.kv_base_url = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_KV_TOKEN") {
            self.kv_token = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_WALLET_RPC_URL") {
            self.wallet_rpc_url = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_WALLET_RPC_USER") {
            self.wallet_rpc_user = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_WALLET_RPC_PASSWORD") {
            self.wallet_rpc_password = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_WEBHOOK_URL") {
            self.webhook_url = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_WEBHOOK_SECRET") {
            self.webhook_secret = Some(v);
        }
        if let Some(v) = env_parsed::<u64>("DEPOSITWATCH_WEBHOOK_TIMEOUT_MS") {
            self.webhook_timeout = Duration::from_millis(v);
        }
        if let Some(v) = env_parsed("DEPOSITWATCH_WEBHOOK_MAX_ATTEMPTS") {
            self.webhook_max_attempts = v;
        }
        if let Some(v) = env_parsed::<u64>("DEPOSITWATCH_WEBHOOK_MAX_RETRY_WINDOW_MS") {
            self.webhook_max_retry_window = Duration::from_millis(v);
        }
        if let Some(v) = env("DEPOSITWATCH_LOG_LEVEL").and_then(|v| parse_log_level(&v)) {
            self.log_level = v;
        }
        if let Some(v) = env("DEPOSITWATCH_LOG_ERROR_FILE") {
            self.log_error_file = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_CALLBACK_SECRET") {
            self.callback_secret = Some(v);
        }
        if let Some(v) = env("DEPOSITWATCH_HTTP_BIND_ADDR") {
            self.http_bind_addr = v;
        }
    }

    pub fn require_kv_base_url(&self) -> Result<&str, ConfigError> {
        self.kv_base_url.as_deref().ok_or(ConfigError::NotConfigured("kvBaseUrl"))
    }

    pub fn require_wallet_rpc_url(&self) -> Result<&str, ConfigError> {
        self.wallet_rpc_url.as_deref().ok_or(ConfigError::NotConfigured("walletRpcUrl"))
    }

    pub fn require_webhook_secret(&self) -> Result<&str, ConfigError> {
        self.webhook_secret.as_deref().ok_or(ConfigError::NotConfigured("webhookSecret"))
    }

    /// Resolves the effective webhook URL for a ticker: its own override if
    /// set, else the top-level default.
    pub fn webhook_url_for(&self, ticker: &str) -> Option<&str> {
        self.ticker_configs
            .get(ticker)
            .and_then(|t| t.webhook_url.as_deref())
            .or(self.webhook_url.as_deref())
    }

    pub fn is_ticker_enabled(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    pub fn log_filter(&self) -> &'static str {
        self.log_level.as_filter()
    }
}

fn parse_log_level(s: &str) -> Option<LogLevel> {
    match s.to_ascii_lowercase().as_str() {
        "error" => Some(LogLevel::Error),
        "warn" => Some(LogLevel::Warn),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        _ => None,
    }
}

fn parse_ledger_mode(s: &str) -> Option<LedgerMode> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Some(LedgerMode::Off),
        "kv" => Some(LedgerMode::Kv),
        "disk" => Some(LedgerMode::Disk),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.scan_count, 100);
        assert_eq!(config.error_backoff, Duration::from_secs(30));
        assert_eq!(config.seen_ttl_seconds, 4 * 3600);
        assert_eq!(config.job_ttl_seconds, 24 * 3600);
        assert_eq!(config.status_ttl_seconds, 7 * 24 * 3600);
        assert_eq!(config.webhook_max_retry_window, Duration::from_secs(2 * 3600));
        assert_eq!(config.key_prefix, "zano");
    }

    #[test]
    fn toml_file_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"
            keyPrefix = "custom"
            scanCount = 50
            tickers = ["zano", "fusd"]
        "#)
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.key_prefix, "custom");
        assert_eq!(config.scan_count, 50);
        assert_eq!(config.tickers, vec!["zano".to_string(), "fusd".to_string()]);
        assert_eq!(config.interval, Duration::from_secs(15));
    }

    #[test]
    fn env_overrides_beat_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"scanCount = 50"#).unwrap();

        std::env::set_var("DEPOSITWATCH_SCAN_COUNT", "77");
        let config = Config::load(Some(file.path())).unwrap();
        std::env::remove_var("DEPOSITWATCH_SCAN_COUNT");

        assert_eq!(config.scan_count, 77);
    }

    #[test]
    fn require_kv_base_url_errors_when_unset() {
        let config = Config::default();
        assert!(matches!(config.require_kv_base_url(), Err(ConfigError::NotConfigured("kvBaseUrl"))));
    }

    #[test]
    fn webhook_url_for_prefers_ticker_override() {
        let mut config = Config::default();
        config.webhook_url = Some("https://default".into());
        config.ticker_configs.insert(
            "fusd".to_string(),
            TickerConfig { decimals: 12, min_confirmations: 1, asset_id: Some("AID".into()), consolidation: ConsolidationConfig::default(), webhook_url: Some("https://fusd".into()) },
        );
        assert_eq!(config.webhook_url_for("fusd"), Some("https://fusd"));
        assert_eq!(config.webhook_url_for("zano"), Some("https://default"));
    }
}
