use thiserror::Error;

/// Errors surfaced by a [`crate::KvStore`] implementation.
///
/// All network/5xx conditions are [`KvError::Transient`]; a missing key on
/// an operation that requires one present is [`KvError::NotFound`]. Every
/// other KV operation treats a missing key as an empty/default value instead
/// of an error (see [`crate::KvStore::hgetall`], [`crate::KvStore::get`]).
#[derive(Debug, Error)]
pub enum KvError {
    /// Network failure or a 5xx response from the store.
    #[error("kv store transient error: {0}")]
    Transient(String),

    /// The requested key does not exist.
    #[error("kv key not found")]
    NotFound,

    /// The store rejected the request outright (4xx other than 404).
    #[error("kv store rejected request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for KvError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transient(err.to_string())
    }
}
