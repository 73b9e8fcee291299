use serde::Serialize;

/// The canonical webhook envelope. Field names are fixed by the receiver
/// contract; `amount`/`paidAmount` carry the same value but are kept
/// distinct because callers populate them from different stages of the
/// pipeline (gross observation vs. the value actually reported at dispatch
/// time, which may differ after consolidation).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub payment_id: String,
    pub address: String,
    pub amount: String,
    pub amount_atomic: String,
    pub paid_amount: String,
    pub paid_amount_atomic: String,
    pub effective_amount: String,
    pub effective_amount_atomic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_atomic: Option<String>,
    pub confirmations: u32,
    pub hash: String,
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}
