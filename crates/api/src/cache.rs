use std::{collections::HashMap, sync::Mutex, time::Duration};

use depositwatch_store::StatusRecord;
use tokio::time::Instant;

struct Entry {
    record: StatusRecord,
    expires_at: Instant,
}

/// In-process TTL cache for Status reads, absorbing polling clients between
/// watcher ticks. Keyed by `"{ticker}:{paymentId}"`; a cache miss or an
/// expired entry always falls through to the caller's own KV read.
pub struct StatusCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, ticker: &str, payment_id: &str) -> Option<StatusRecord> {
        let key = cache_key(ticker, payment_id);
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(&key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.record.clone())
    }

    pub fn put(&self, ticker: &str, payment_id: &str, record: StatusRecord) {
        let key = cache_key(ticker, payment_id);
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, Entry { record, expires_at: Instant::now() + self.ttl });
    }
}

fn cache_key(ticker: &str, payment_id: &str) -> String {
    format!("{ticker}:{payment_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit_after_put() {
        let cache = StatusCache::new(Duration::from_secs(5));
        assert!(cache.get("zano", "pid1").is_none());

        let status = StatusRecord::pending("zano", "A", "pid1", 1, 1000);
        cache.put("zano", "pid1", status.clone());
        assert_eq!(cache.get("zano", "pid1"), Some(status));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = StatusCache::new(Duration::from_millis(100));
        cache.put("zano", "pid1", StatusRecord::pending("zano", "A", "pid1", 1, 1000));
        assert!(cache.get("zano", "pid1").is_some());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(cache.get("zano", "pid1").is_none());
    }
}
