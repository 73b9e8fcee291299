//! Typed key-value abstraction used throughout the deposit watcher.
//!
//! The watcher never talks to a concrete store directly; every crate that
//! needs durable state takes a `&dyn KvStore` (or an `Arc<dyn KvStore>`) and
//! is agnostic to what backs it. [`RestKvStore`] is the production
//! implementation, talking to a remote KV service over HTTP.

mod error;
mod json;
mod rest;
mod store;

#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use error::KvError;
pub use json::{get_json, set_json};
pub use rest::RestKvStore;
pub use store::{KvStore, ScanPage};

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryKvStore;
