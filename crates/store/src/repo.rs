use depositwatch_kv::{get_json, set_json, KvStore};

use crate::{
    config::StoreConfig,
    error::StoreError,
    job::{JobPatch, JobRecord},
    keys,
    ledger::LedgerRecord,
    status::StatusRecord,
};

/// Loads a Job by `(ticker, paymentId)`. Returns `Ok(None)` both when the
/// key is absent and when its fields fail to decode (missing `address`).
/// Prefer [`load_job_outcome`] where the distinction matters (state machine
/// step 1 deletes a malformed Job but leaves an absent one alone).
pub async fn load_job(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str) -> Result<Option<JobRecord>, StoreError> {
    match load_job_outcome(kv, cfg, ticker, payment_id).await? {
        JobLoadOutcome::Found(job) => Ok(Some(job)),
        JobLoadOutcome::Missing | JobLoadOutcome::Malformed => Ok(None),
    }
}

#[derive(Debug)]
pub enum JobLoadOutcome {
    /// No key present at all.
    Missing,
    /// A hash exists but is missing required fields (`address`).
    Malformed,
    Found(JobRecord),
}

pub async fn load_job_outcome(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str) -> Result<JobLoadOutcome, StoreError> {
    let key = keys::job_key(&cfg.prefix, ticker, payment_id);
    let fields = kv.hgetall(&key).await?;
    if fields.is_empty() {
        return Ok(JobLoadOutcome::Missing);
    }
    Ok(match JobRecord::from_fields(&fields) {
        Some(job) => JobLoadOutcome::Found(job),
        None => JobLoadOutcome::Malformed,
    })
}

/// Creates a brand new Job, writing every field and setting the Job TTL.
pub async fn create_job(kv: &dyn KvStore, cfg: &StoreConfig, job: &JobRecord) -> Result<(), StoreError> {
    let key = keys::job_key(&cfg.prefix, &job.ticker, &job.payment_id);
    kv.hset(&key, &job.to_fields()).await?;
    kv.expire(&key, cfg.job_ttl_seconds).await?;
    Ok(())
}

/// Applies a sparse [`JobPatch`] to an existing Job. A no-op patch skips the
/// KV round trip entirely.
pub async fn patch_job(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str, patch: JobPatch) -> Result<(), StoreError> {
    if patch.is_empty() {
        return Ok(());
    }
    let key = keys::job_key(&cfg.prefix, ticker, payment_id);
    kv.hset(&key, &patch.into_fields()).await?;
    Ok(())
}

pub async fn delete_job(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str) -> Result<(), StoreError> {
    let key = keys::job_key(&cfg.prefix, ticker, payment_id);
    kv.del(&key).await?;
    Ok(())
}

/// One page of a ticker's Job scan. Call repeatedly, threading `cursor`
/// through, until the returned cursor is `"0"`.
pub async fn scan_jobs(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, batch_size: u32, cursor: &str) -> Result<(String, Vec<String>), StoreError> {
    let pattern = keys::job_scan_pattern(&cfg.prefix, ticker);
    Ok(kv.scan(&pattern, batch_size, cursor).await?)
}

/// Extracts `(ticker, paymentId)` from a Job key produced by
/// [`keys::job_key`]. Returns `None` for any key that doesn't match the
/// expected shape (defensive against a scan picking up a foreign key under
/// a shared prefix).
pub fn parse_job_key<'a>(cfg: &StoreConfig, key: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = key.strip_prefix(&cfg.prefix)?.strip_prefix(":deposit:")?;
    rest.split_once(':')
}

pub async fn load_status(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str) -> Result<Option<StatusRecord>, StoreError> {
    let key = keys::status_key(&cfg.prefix, ticker, payment_id);
    Ok(get_json(kv, &key).await?)
}

pub async fn write_status(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, payment_id: &str, status: &StatusRecord) -> Result<(), StoreError> {
    let key = keys::status_key(&cfg.prefix, ticker, payment_id);
    set_json(kv, &key, status, Some(cfg.status_ttl_seconds)).await?;
    Ok(())
}

pub async fn is_seen(kv: &dyn KvStore, cfg: &StoreConfig, tx_hash: &str) -> Result<bool, StoreError> {
    let key = keys::seen_key(&cfg.prefix, tx_hash);
    Ok(kv.exists(&key).await?)
}

pub async fn mark_seen(kv: &dyn KvStore, cfg: &StoreConfig, tx_hash: &str) -> Result<(), StoreError> {
    let key = keys::seen_key(&cfg.prefix, tx_hash);
    kv.set(&key, "1", Some(cfg.seen_ttl_seconds)).await?;
    Ok(())
}

/// Merges a fresh observation into the Ledger, preserving `firstSeenAt` if
/// a record already exists.
pub async fn upsert_ledger(kv: &dyn KvStore, cfg: &StoreConfig, ticker: &str, tx_hash: &str, amount_atomic: &str, confirmations: u32, now: i64) -> Result<(), StoreError> {
    let key = keys::ledger_key(&cfg.prefix, ticker, tx_hash);
    let fields = kv.hgetall(&key).await?;
    let record = match LedgerRecord::from_fields(&fields) {
        Some(existing) => existing.touch(confirmations, now),
        None => LedgerRecord::first_seen(tx_hash, ticker, amount_atomic, confirmations, now),
    };
    kv.hset(&key, &record.to_fields()).await?;
    if let Some(ttl) = cfg.ledger_ttl_seconds {
        kv.expire(&key, ttl).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depositwatch_kv::MemoryKvStore;

    #[tokio::test]
    async fn create_then_load_round_trips() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        let job = JobRecord::new("zano", "A", "pid1", 3, 1000);
        create_job(&kv, &cfg, &job).await.unwrap();

        let loaded = load_job(&kv, &cfg, "zano", "pid1").await.unwrap().unwrap();
        assert_eq!(loaded, job);
    }

    #[tokio::test]
    async fn load_missing_job_is_none() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        assert!(load_job(&kv, &cfg, "zano", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_job_outcome_distinguishes_missing_from_malformed() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        assert!(matches!(load_job_outcome(&kv, &cfg, "zano", "missing").await.unwrap(), JobLoadOutcome::Missing));

        let key = keys::job_key(&cfg.prefix, "zano", "pid1");
        kv.hset(&key, &std::collections::HashMap::from([("paymentId".to_string(), "pid1".to_string())])).await.unwrap();
        assert!(matches!(load_job_outcome(&kv, &cfg, "zano", "pid1").await.unwrap(), JobLoadOutcome::Malformed));
    }

    #[tokio::test]
    async fn patch_then_load_reflects_change() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        let job = JobRecord::new("zano", "A", "pid1", 3, 1000);
        create_job(&kv, &cfg, &job).await.unwrap();

        let patch = JobPatch::new().set_bool("webhookSent", true);
        patch_job(&kv, &cfg, "zano", "pid1", patch).await.unwrap();

        let loaded = load_job(&kv, &cfg, "zano", "pid1").await.unwrap().unwrap();
        assert!(loaded.webhook_sent);
        assert_eq!(loaded.address, "A");
    }

    #[tokio::test]
    async fn delete_removes_job() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        let job = JobRecord::new("zano", "A", "pid1", 3, 1000);
        create_job(&kv, &cfg, &job).await.unwrap();
        delete_job(&kv, &cfg, "zano", "pid1").await.unwrap();
        assert!(load_job(&kv, &cfg, "zano", "pid1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_round_trips_as_json() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        let status = StatusRecord::pending("zano", "A", "pid1", 3, 1000);
        write_status(&kv, &cfg, "zano", "pid1", &status).await.unwrap();
        let loaded = load_status(&kv, &cfg, "zano", "pid1").await.unwrap().unwrap();
        assert_eq!(loaded, status);
    }

    #[tokio::test]
    async fn seen_guard_round_trips() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        assert!(!is_seen(&kv, &cfg, "H").await.unwrap());
        mark_seen(&kv, &cfg, "H").await.unwrap();
        assert!(is_seen(&kv, &cfg, "H").await.unwrap());
    }

    #[tokio::test]
    async fn ledger_upsert_preserves_first_seen() {
        let kv = MemoryKvStore::new();
        let cfg = StoreConfig::default();
        upsert_ledger(&kv, &cfg, "zano", "H", "1000", 1, 100).await.unwrap();
        upsert_ledger(&kv, &cfg, "zano", "H", "1000", 3, 200).await.unwrap();

        let fields = kv.hgetall(&keys::ledger_key(&cfg.prefix, "zano", "H")).await.unwrap();
        let record = LedgerRecord::from_fields(&fields).unwrap();
        assert_eq!(record.first_seen_at, 100);
        assert_eq!(record.last_seen_at, 200);
        assert_eq!(record.last_confirmations, 3);
    }

    #[test]
    fn parse_job_key_extracts_ticker_and_payment_id() {
        let cfg = StoreConfig::default();
        let key = keys::job_key(&cfg.prefix, "zano", "pid1");
        assert_eq!(parse_job_key(&cfg, &key), Some(("zano", "pid1")));
        assert_eq!(parse_job_key(&cfg, "unrelated:key"), None);
    }
}
