//! Pure, allocation-light helpers shared across the deposit watcher: the
//! atomic-amount decimal codec and the dynamic confirmation-count policy.
//!
//! Nothing in this crate performs I/O or holds async state; it exists so the
//! arithmetic at the center of the system can be unit-tested in isolation
//! from the KV store, the wallet RPC client, and the scheduler.

mod amount;
mod confirmation;

pub use amount::{format_atomic, normalize_decimal, parse_atomic, try_format_raw_amount};
pub use confirmation::dynamic_min_conf;

pub use alloy_primitives::U256;
