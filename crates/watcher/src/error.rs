use thiserror::Error;

/// Top-level watcher error. Only the [`Self::Rpc`] variant is meaningful to
/// the Scheduler — it signals ticker-level backoff; every other variant is
/// logged by the caller and the next Job is processed.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error(transparent)]
    Rpc(#[from] depositwatch_walletrpc::RpcError),

    #[error(transparent)]
    Store(#[from] depositwatch_store::StoreError),
}

impl WatcherError {
    pub fn is_rpc(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}
