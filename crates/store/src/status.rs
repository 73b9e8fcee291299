use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Confirming,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The JSON blob written at every Job state change, and read directly by
/// the public status API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub status: JobStatus,
    pub ticker: String,
    pub address: String,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
    pub confirmations: u32,
    pub required_confirmations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount_atomic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_amount_atomic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_atomic: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_error: Option<String>,
}

impl StatusRecord {
    pub fn pending(ticker: &str, address: &str, payment_id: &str, required_confirmations: u32, created_at: i64) -> Self {
        Self {
            status: JobStatus::Pending,
            ticker: ticker.to_string(),
            address: address.to_string(),
            payment_id: payment_id.to_string(),
            client_reference: None,
            confirmations: 0,
            required_confirmations,
            hash: None,
            paid_amount: None,
            paid_amount_atomic: None,
            effective_amount: None,
            effective_amount_atomic: None,
            fee_atomic: None,
            created_at,
            updated_at: created_at,
            webhook_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let status = StatusRecord::pending("zano", "A", "pid1", 1, 1000);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"requiredConfirmations\":1"));
        assert!(!json.contains("\"hash\""));
    }

    #[test]
    fn round_trips_through_json() {
        let mut status = StatusRecord::pending("zano", "A", "pid1", 3, 1000);
        status.status = JobStatus::Completed;
        status.hash = Some("H".into());
        status.paid_amount_atomic = Some("60000000000000".into());

        let json = serde_json::to_string(&status).unwrap();
        let decoded: StatusRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, status);
    }
}
