//! Typed records and key layout for the deposit watcher's persisted state:
//! Job, Status, Seen, and Ledger, all living in a shared KV store under a
//! configurable prefix (see [`StoreConfig`]).

mod config;
mod error;
mod job;
mod keys;
mod ledger;
mod repo;
mod status;

pub use config::StoreConfig;
pub use error::StoreError;
pub use job::{JobPatch, JobRecord};
pub use keys::{job_key, job_scan_pattern, ledger_key, seen_key, status_key};
pub use ledger::LedgerRecord;
pub use repo::{
    create_job, delete_job, is_seen, load_job, load_job_outcome, load_status, mark_seen, parse_job_key, patch_job, scan_jobs, upsert_ledger,
    write_status, JobLoadOutcome,
};
pub use status::{JobStatus, StatusRecord};
