use std::collections::HashMap;

/// Optional append-only audit record per `(ticker, txHash)`: when the
/// deposit was first and last observed, and how the webhook eventually
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub tx_hash: String,
    pub ticker: String,
    pub amount_atomic: String,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
    pub last_confirmations: u32,
    pub webhook_outcome: Option<String>,
    pub webhook_resolved_at: Option<i64>,
}

impl LedgerRecord {
    pub fn first_seen(tx_hash: &str, ticker: &str, amount_atomic: &str, confirmations: u32, now: i64) -> Self {
        Self {
            tx_hash: tx_hash.to_string(),
            ticker: ticker.to_string(),
            amount_atomic: amount_atomic.to_string(),
            first_seen_at: now,
            last_seen_at: now,
            last_confirmations: confirmations,
            webhook_outcome: None,
            webhook_resolved_at: None,
        }
    }

    /// Merges a fresh observation into an existing record: `firstSeenAt` is
    /// preserved, `lastSeenAt`/`lastConfirmations` advance.
    pub fn touch(mut self, confirmations: u32, now: i64) -> Self {
        self.last_seen_at = now;
        self.last_confirmations = confirmations;
        self
    }

    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        out.insert("txHash".into(), self.tx_hash.clone());
        out.insert("ticker".into(), self.ticker.clone());
        out.insert("amountAtomic".into(), self.amount_atomic.clone());
        out.insert("firstSeenAt".into(), self.first_seen_at.to_string());
        out.insert("lastSeenAt".into(), self.last_seen_at.to_string());
        out.insert("lastConfirmations".into(), self.last_confirmations.to_string());
        if let Some(v) = &self.webhook_outcome {
            out.insert("webhookOutcome".into(), v.clone());
        }
        if let Some(v) = self.webhook_resolved_at {
            out.insert("webhookResolvedAt".into(), v.to_string());
        }
        out
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            tx_hash: fields.get("txHash")?.clone(),
            ticker: fields.get("ticker").cloned().unwrap_or_default(),
            amount_atomic: fields.get("amountAtomic").cloned().unwrap_or_default(),
            first_seen_at: fields.get("firstSeenAt").and_then(|v| v.parse().ok()).unwrap_or(0),
            last_seen_at: fields.get("lastSeenAt").and_then(|v| v.parse().ok()).unwrap_or(0),
            last_confirmations: fields.get("lastConfirmations").and_then(|v| v.parse().ok()).unwrap_or(0),
            webhook_outcome: fields.get("webhookOutcome").cloned(),
            webhook_resolved_at: fields.get("webhookResolvedAt").and_then(|v| v.parse().ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_preserves_first_seen() {
        let record = LedgerRecord::first_seen("H", "zano", "1000", 1, 100).touch(3, 200);
        assert_eq!(record.first_seen_at, 100);
        assert_eq!(record.last_seen_at, 200);
        assert_eq!(record.last_confirmations, 3);
    }

    #[test]
    fn round_trips_through_fields() {
        let record = LedgerRecord::first_seen("H", "zano", "1000", 1, 100);
        let decoded = LedgerRecord::from_fields(&record.to_fields()).unwrap();
        assert_eq!(decoded, record);
    }
}
