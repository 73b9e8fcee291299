/// KV namespace and TTL policy shared by every repository function. Cloned
/// cheaply and passed by value — this is the persisted-state half of the
/// process `Config`, not the whole of it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub prefix: String,
    pub job_ttl_seconds: u64,
    pub status_ttl_seconds: u64,
    pub seen_ttl_seconds: u64,
    /// `None` disables the Ledger TTL (keys never expire); operator-chosen,
    /// unlike the other three which have normative defaults.
    pub ledger_ttl_seconds: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: "zano".to_string(),
            job_ttl_seconds: 24 * 3600,
            status_ttl_seconds: 7 * 24 * 3600,
            seen_ttl_seconds: 4 * 3600,
            ledger_ttl_seconds: None,
        }
    }
}
