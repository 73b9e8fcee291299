use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::KvError;

/// A cursor-scan page: the cursor to pass on the next call (`"0"` once the
/// scan has wrapped around) and the keys found in this batch. No ordering
/// guarantee is made across pages.
pub type ScanPage = (String, Vec<String>);

/// Typed operations over a remote key-value store.
///
/// All operations are single-key atomic. Implementations must treat network
/// failures and 5xx responses as [`KvError::Transient`]; a missing key is
/// never an error except where documented (`hgetall`, `get`, `exists` all
/// treat absence as a normal, non-error outcome).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Scans keys matching a glob `pattern` in batches of at most
    /// `batch_size`, starting from `cursor` (use `"0"` for the first call).
    /// The scan is complete once the returned cursor is `"0"` again.
    async fn scan(&self, pattern: &str, batch_size: u32, cursor: &str) -> Result<ScanPage, KvError>;

    /// Returns all fields of a hash key, or an empty map if the key is
    /// absent.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError>;

    /// Upserts the given fields of a hash key without disturbing any other
    /// field already present.
    async fn hset(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), KvError>;

    /// Refreshes a key's TTL without touching its value.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<(), KvError>;

    /// Returns a string key's value, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Sets a string key's value, optionally with a TTL.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), KvError>;

    /// Tests whether a key (of any kind) exists.
    async fn exists(&self, key: &str) -> Result<bool, KvError>;

    /// Deletes a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), KvError>;
}
