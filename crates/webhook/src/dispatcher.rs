use std::time::Duration;

use crate::{error::WebhookError, payload::WebhookPayload};

const SECRET_HEADER: &str = "X-Zano-Secret";

/// Outcome of a single delivery attempt. Never returns `Err` — callers
/// inspect `ok`/`status_code`/`error` and drive their own retry bookkeeping,
/// matching the source contract where a failed delivery is data, not an
/// exception.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

pub async fn dispatch(client: &reqwest::Client, payload: &WebhookPayload, url: &str, secret: &str, timeout: Duration) -> DispatchOutcome {
    let result = client
        .post(url)
        .timeout(timeout)
        .header(SECRET_HEADER, secret)
        .json(payload)
        .send()
        .await;

    match result {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                DispatchOutcome { ok: true, status_code: Some(status.as_u16()), error: None }
            } else {
                let body = resp.text().await.unwrap_or_default();
                let err = WebhookError::Http { status: status.as_u16(), body };
                DispatchOutcome { ok: false, status_code: Some(status.as_u16()), error: Some(truncate(&err.to_string())) }
            }
        }
        Err(err) => {
            let err = WebhookError::Network(err.to_string());
            DispatchOutcome { ok: false, status_code: None, error: Some(truncate(&err.to_string())) }
        }
    }
}

/// Webhook errors are stored on the Job record, so they're capped at the
/// spec's 500-character limit.
fn truncate(message: &str) -> String {
    if message.len() <= 500 {
        message.to_string()
    } else {
        message.chars().take(500).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method},
        Mock, MockServer, ResponseTemplate,
    };

    fn sample_payload() -> WebhookPayload {
        WebhookPayload {
            payment_id: "pid1".into(),
            address: "A".into(),
            amount: "60".into(),
            amount_atomic: "60000000000000".into(),
            paid_amount: "60".into(),
            paid_amount_atomic: "60000000000000".into(),
            effective_amount: "60".into(),
            effective_amount_atomic: "60000000000000".into(),
            fee_atomic: None,
            confirmations: 3,
            hash: "H".into(),
            ticker: "zano".into(),
            client_reference: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn success_on_2xx_and_sends_secret_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header(SECRET_HEADER, "s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let outcome = dispatch(&client, &sample_payload(), &server.uri(), "s3cret", Duration::from_secs(5)).await;
        assert!(outcome.ok);
        assert_eq!(outcome.status_code, Some(200));
    }

    #[tokio::test]
    async fn failure_on_5xx_captures_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500).set_body_string("boom")).mount(&server).await;

        let client = reqwest::Client::new();
        let outcome = dispatch(&client, &sample_payload(), &server.uri(), "s3cret", Duration::from_secs(5)).await;
        assert!(!outcome.ok);
        assert_eq!(outcome.status_code, Some(500));
        assert!(outcome.error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn network_failure_has_no_status_code() {
        let client = reqwest::Client::new();
        let outcome = dispatch(&client, &sample_payload(), "http://127.0.0.1:1", "s3cret", Duration::from_millis(200)).await;
        assert!(!outcome.ok);
        assert_eq!(outcome.status_code, None);
        assert!(outcome.error.is_some());
    }
}
