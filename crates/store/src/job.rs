use std::collections::HashMap;

/// The Job record: the single mutable state a ticker's watcher task advances
/// through `PENDING` → `CONFIRMING` → terminal. Lives as a hash key; callers
/// should write only the fields that changed via [`JobPatch`] rather than
/// re-serializing the whole record, to keep blast radius small when another
/// path writes a disjoint field concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub ticker: String,
    pub address: String,
    pub payment_id: String,
    pub expected_amount: Option<String>,
    pub min_conf: u32,
    pub client_reference: Option<String>,
    pub created_at: i64,
    pub dynamic_min_conf_applied: bool,
    pub webhook_sent: bool,
    pub webhook_attempts: u32,
    pub webhook_first_attempt_at: Option<i64>,
    pub webhook_last_attempt_at: Option<i64>,
    pub webhook_next_attempt_at: Option<i64>,
    pub webhook_last_error: Option<String>,
    pub consolidation_attempted: bool,
    pub consolidation_tx_id: Option<String>,
    pub consolidation_error: Option<String>,
}

/// A sparse set of field updates, built up by the state machine and written
/// with a single `hset` call.
#[derive(Debug, Default, Clone)]
pub struct JobPatch(HashMap<String, String>);

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<String>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn set_opt(self, field: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.set(field, v),
            None => self,
        }
    }

    pub fn set_bool(self, field: &str, value: bool) -> Self {
        self.set(field, value.to_string())
    }

    pub fn set_i64(self, field: &str, value: i64) -> Self {
        self.set(field, value.to_string())
    }

    pub fn set_u32(self, field: &str, value: u32) -> Self {
        self.set(field, value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_fields(self) -> HashMap<String, String> {
        self.0
    }
}

fn parse_bool(fields: &HashMap<String, String>, key: &str) -> bool {
    fields.get(key).map(|v| v == "true" || v == "1").unwrap_or(false)
}

fn parse_i64_opt(fields: &HashMap<String, String>, key: &str) -> Option<i64> {
    fields.get(key).and_then(|v| v.parse().ok())
}

impl JobRecord {
    pub fn new(ticker: impl Into<String>, address: impl Into<String>, payment_id: impl Into<String>, min_conf: u32, created_at: i64) -> Self {
        Self {
            ticker: ticker.into(),
            address: address.into(),
            payment_id: payment_id.into(),
            expected_amount: None,
            min_conf,
            client_reference: None,
            created_at,
            dynamic_min_conf_applied: false,
            webhook_sent: false,
            webhook_attempts: 0,
            webhook_first_attempt_at: None,
            webhook_last_attempt_at: None,
            webhook_next_attempt_at: None,
            webhook_last_error: None,
            consolidation_attempted: false,
            consolidation_tx_id: None,
            consolidation_error: None,
        }
    }

    /// Full serialization, used when creating a Job from scratch. Subsequent
    /// mutations should go through [`JobPatch`] instead.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        out.insert("ticker".into(), self.ticker.clone());
        out.insert("address".into(), self.address.clone());
        out.insert("paymentId".into(), self.payment_id.clone());
        if let Some(v) = &self.expected_amount {
            out.insert("expectedAmount".into(), v.clone());
        }
        out.insert("minConf".into(), self.min_conf.to_string());
        if let Some(v) = &self.client_reference {
            out.insert("clientReference".into(), v.clone());
        }
        out.insert("createdAt".into(), self.created_at.to_string());
        out.insert("dynamicMinConfApplied".into(), self.dynamic_min_conf_applied.to_string());
        out.insert("webhookSent".into(), self.webhook_sent.to_string());
        out.insert("webhookAttempts".into(), self.webhook_attempts.to_string());
        if let Some(v) = self.webhook_first_attempt_at {
            out.insert("webhookFirstAttemptAt".into(), v.to_string());
        }
        if let Some(v) = self.webhook_last_attempt_at {
            out.insert("webhookLastAttemptAt".into(), v.to_string());
        }
        if let Some(v) = self.webhook_next_attempt_at {
            out.insert("webhookNextAttemptAt".into(), v.to_string());
        }
        if let Some(v) = &self.webhook_last_error {
            out.insert("webhookLastError".into(), v.clone());
        }
        out.insert("consolidationAttempted".into(), self.consolidation_attempted.to_string());
        if let Some(v) = &self.consolidation_tx_id {
            out.insert("consolidationTxId".into(), v.clone());
        }
        if let Some(v) = &self.consolidation_error {
            out.insert("consolidationError".into(), v.clone());
        }
        out
    }

    /// Decodes a Job from raw hash fields. Missing `address` or `paymentId`
    /// returns `None` — the caller (state machine step 1) treats that as a
    /// malformed Job and deletes it; this function never panics on garbage
    /// input.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let address = fields.get("address")?.clone();
        let payment_id = fields.get("paymentId").cloned().unwrap_or_default();
        let ticker = fields.get("ticker").cloned().unwrap_or_default();
        let min_conf = fields.get("minConf").and_then(|v| v.parse().ok()).unwrap_or(1);
        let created_at = fields.get("createdAt").and_then(|v| v.parse().ok()).unwrap_or(0);

        Some(Self {
            ticker,
            address,
            payment_id,
            expected_amount: fields.get("expectedAmount").cloned(),
            min_conf,
            client_reference: fields.get("clientReference").cloned(),
            created_at,
            dynamic_min_conf_applied: parse_bool(fields, "dynamicMinConfApplied"),
            webhook_sent: parse_bool(fields, "webhookSent"),
            webhook_attempts: fields.get("webhookAttempts").and_then(|v| v.parse().ok()).unwrap_or(0),
            webhook_first_attempt_at: parse_i64_opt(fields, "webhookFirstAttemptAt"),
            webhook_last_attempt_at: parse_i64_opt(fields, "webhookLastAttemptAt"),
            webhook_next_attempt_at: parse_i64_opt(fields, "webhookNextAttemptAt"),
            webhook_last_error: fields.get("webhookLastError").cloned(),
            consolidation_attempted: parse_bool(fields, "consolidationAttempted"),
            consolidation_tx_id: fields.get("consolidationTxId").cloned(),
            consolidation_error: fields.get("consolidationError").cloned(),
        })
    }

    /// `true` once `paymentId` has ever been populated on the record.
    pub fn has_payment_id(&self) -> bool {
        !self.payment_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_fields() {
        let mut job = JobRecord::new("zano", "A", "pid1", 3, 1000);
        job.client_reference = Some("r1".into());
        job.webhook_attempts = 2;
        job.webhook_first_attempt_at = Some(5000);

        let fields = job.to_fields();
        let decoded = JobRecord::from_fields(&fields).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn missing_address_decodes_to_none() {
        let fields = HashMap::from([("paymentId".to_string(), "pid1".to_string())]);
        assert!(JobRecord::from_fields(&fields).is_none());
    }

    #[test]
    fn missing_payment_id_decodes_with_empty_string() {
        let fields = HashMap::from([("address".to_string(), "A".to_string())]);
        let job = JobRecord::from_fields(&fields).unwrap();
        assert!(!job.has_payment_id());
    }

    #[test]
    fn patch_only_carries_set_fields() {
        let patch = JobPatch::new().set_bool("webhookSent", true).set_opt("webhookLastError", None::<String>);
        let fields = patch.into_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("webhookSent"), Some(&"true".to_string()));
    }
}
