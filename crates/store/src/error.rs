use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Kv(#[from] depositwatch_kv::KvError),
}
