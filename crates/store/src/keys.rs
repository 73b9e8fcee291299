//! KV key layout. Every key is namespaced under a caller-supplied `prefix`
//! (default `"zano"`) so one KV store can host more than one deployment.

pub fn job_key(prefix: &str, ticker: &str, payment_id: &str) -> String {
    format!("{prefix}:deposit:{ticker}:{payment_id}")
}

/// Glob pattern matching every Job key for `ticker`, for use with
/// [`depositwatch_kv::KvStore::scan`].
pub fn job_scan_pattern(prefix: &str, ticker: &str) -> String {
    format!("{prefix}:deposit:{ticker}:*")
}

pub fn status_key(prefix: &str, ticker: &str, payment_id: &str) -> String {
    format!("{prefix}:transaction:status:{ticker}:{payment_id}")
}

pub fn seen_key(prefix: &str, tx_hash: &str) -> String {
    format!("{prefix}:seen:{tx_hash}")
}

pub fn ledger_key(prefix: &str, ticker: &str, tx_hash: &str) -> String {
    format!("{prefix}:deposit:ledger:{ticker}:{tx_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_documented_patterns() {
        assert_eq!(job_key("zano", "zano", "pid1"), "zano:deposit:zano:pid1");
        assert_eq!(job_scan_pattern("zano", "zano"), "zano:deposit:zano:*");
        assert_eq!(status_key("zano", "zano", "pid1"), "zano:transaction:status:zano:pid1");
        assert_eq!(seen_key("zano", "H"), "zano:seen:H");
        assert_eq!(ledger_key("zano", "zano", "H"), "zano:deposit:ledger:zano:H");
    }
}
