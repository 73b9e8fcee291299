use serde::Deserialize;

/// Per-ticker settings, keyed by ticker symbol in [`crate::Config::tickers`].
#[derive(Debug, Clone, Deserialize)]
pub struct TickerConfig {
    /// Atomic-to-decimal scale, e.g. `12` for Zano.
    pub decimals: u8,
    /// Initial threshold before the dynamic confirmation policy is applied.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,
    /// Non-empty selects asset mode (`get_recent_txs_and_info2` only);
    /// empty or absent selects base-coin mode (`get_payments` first).
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    /// Overrides the default `webhookUrl` for this ticker specifically.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_min_confirmations() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub fee_atomic: Option<String>,
    /// May differ from the Job's deposit `minConf`.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,
    #[serde(default = "default_mixin")]
    pub mixin: u32,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_mixin() -> u32 {
    3
}

fn default_priority() -> u32 {
    0
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self { enabled: false, address: None, fee_atomic: None, min_confirmations: default_min_confirmations(), mixin: default_mixin(), priority: default_priority() }
    }
}
