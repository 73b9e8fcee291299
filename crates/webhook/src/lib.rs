//! Outbound webhook delivery: the canonical payload envelope, a pure
//! exponential-backoff delay function, and the HTTP dispatch itself.

mod backoff;
mod dispatcher;
mod error;
mod payload;

pub use backoff::BackoffPolicy;
pub use dispatcher::{dispatch, DispatchOutcome};
pub use error::WebhookError;
pub use payload::WebhookPayload;
