use std::{
    collections::HashMap,
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{error::KvError, store::ScanPage, KvStore};

#[derive(Default)]
struct Inner {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// An in-process, single-node stand-in for [`RestKvStore`][crate::RestKvStore],
/// used by this crate's own tests and by downstream crates that need a
/// `KvStore` without standing up an HTTP server. TTLs are accepted but not
/// enforced — nothing in this store ever expires on its own.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: Mutex<Inner>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `*` matches any run of characters; every other character must match
/// literally. Sufficient for the `prefix:*` patterns this codebase scans
/// with.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == candidate,
        Some((prefix, suffix)) => {
            candidate.len() >= prefix.len() + suffix.len()
                && candidate.starts_with(prefix)
                && candidate.ends_with(suffix)
        }
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn scan(&self, pattern: &str, batch_size: u32, cursor: &str) -> Result<ScanPage, KvError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<String> = inner
            .strings
            .keys()
            .chain(inner.hashes.keys())
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();

        let start: usize = cursor.parse().unwrap_or(0);
        let batch_size = batch_size.max(1) as usize;
        let end = (start + batch_size).min(matches.len());
        let page = matches.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = if end >= matches.len() { "0".to_string() } else { end.to_string() };
        Ok((next_cursor, page))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        Ok(self.inner.lock().unwrap().hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hset(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.hashes.entry(key.to_string()).or_default();
        for (k, v) in fields {
            entry.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn expire(&self, _key: &str, _ttl_seconds: u64) -> Result<(), KvError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.inner.lock().unwrap().strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_seconds: Option<u64>) -> Result<(), KvError> {
        self.inner.lock().unwrap().strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.strings.contains_key(key) || inner.hashes.contains_key(key))
    }

    async fn del(&self, key: &str) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        inner.strings.remove(key);
        inner.hashes.remove(key);
        Ok(())
    }
}
