//! JSON-RPC client for the wallet daemon and the Deposit Matcher that turns
//! its responses into normalized [`DepositObservation`]s.

mod client;
mod error;
mod matcher;
mod observation;

pub use client::{
    confirmations_from_height, parse_amount_atomic, IntegratedAddress, TransferDestination, TransferResult, WalletInfo, WalletRpcClient,
};
pub use error::RpcError;
pub use matcher::{best_observation, match_deposits};
pub use observation::{dedup_by_hash, flatten_entries, observations_from_payments, observations_from_transfers, DepositObservation};
