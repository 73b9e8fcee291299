use metrics::{Counter, Gauge};

/// Process-wide counters for the scheduler and the webhook dispatcher it
/// drives. Cloned into every ticker task; the underlying handles are shared
/// with whatever recorder the binary installs.
#[derive(Debug, Clone)]
pub struct WatcherMetrics {
    pub jobs_scanned: Counter,
    pub jobs_completed: Counter,
    pub jobs_failed: Counter,
    pub webhook_attempts: Counter,
    pub webhook_successes: Counter,
    pub ticker_backoffs: Counter,
    pub active_tickers: Gauge,
}

impl WatcherMetrics {
    pub fn new() -> Self {
        Self {
            jobs_scanned: metrics::counter!("depositwatch_jobs_scanned_total"),
            jobs_completed: metrics::counter!("depositwatch_jobs_completed_total"),
            jobs_failed: metrics::counter!("depositwatch_jobs_failed_total"),
            webhook_attempts: metrics::counter!("depositwatch_webhook_attempts_total"),
            webhook_successes: metrics::counter!("depositwatch_webhook_successes_total"),
            ticker_backoffs: metrics::counter!("depositwatch_ticker_backoffs_total"),
            active_tickers: metrics::gauge!("depositwatch_active_tickers"),
        }
    }
}

impl Default for WatcherMetrics {
    fn default() -> Self {
        Self::new()
    }
}
