use thiserror::Error;

/// Wallet RPC failures. The Scheduler treats any `RpcError` as a signal to
/// back off the whole ticker rather than just the Job that triggered it.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("wallet rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("wallet rpc http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("wallet rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("failed to decode wallet rpc response: {0}")]
    Decode(String),
}
