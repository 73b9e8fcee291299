use thiserror::Error;

/// Structured classification of a failed delivery attempt. Never
/// propagated as a `Result::Err` past [`crate::dispatch`] — it is recorded
/// as a string on the Job (`webhookLastError`), not raised as an
/// exception, matching the source's "webhook failure is data" contract.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook transport error: {0}")]
    Network(String),

    #[error("webhook http {status}: {body}")]
    Http { status: u16, body: String },
}
