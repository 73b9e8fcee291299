use rand::Rng;

/// Exponential backoff shape for webhook retries. Kept as a pure function
/// rather than an in-process retry loop (unlike the teacher's `backon`
/// usage elsewhere in this codebase) because retry state here must survive
/// a process restart: the attempt count and next-attempt timestamp are
/// persisted on the Job record, and the scheduler recomputes this delay
/// fresh on every pass rather than holding a live retry future.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub factor: f64,
    pub max_ms: u64,
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base_ms: 1000, factor: 2.0, max_ms: 20 * 60 * 1000, jitter: true }
    }
}

impl BackoffPolicy {
    /// `min(baseMs * factor^attempts, maxMs)`, then optionally redrawn
    /// uniformly from `[0, delay]`.
    pub fn delay_ms(&self, attempts: u32) -> u64 {
        let raw = self.base_ms as f64 * self.factor.powi(attempts as i32);
        let capped = raw.min(self.max_ms as f64) as u64;
        if self.jitter {
            self.jittered(capped)
        } else {
            capped
        }
    }

    fn jittered(&self, delay: u64) -> u64 {
        if delay == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..=delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_spec_scenario_without_jitter() {
        let policy = BackoffPolicy { base_ms: 1000, factor: 2.0, max_ms: 20 * 60 * 1000, jitter: false };
        assert_eq!(policy.delay_ms(0), 1000);
        assert_eq!(policy.delay_ms(1), 2000);
        assert_eq!(policy.delay_ms(2), 4000);
    }

    #[test]
    fn caps_at_max_ms() {
        let policy = BackoffPolicy { base_ms: 1000, factor: 2.0, max_ms: 5000, jitter: false };
        assert_eq!(policy.delay_ms(10), 5000);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = BackoffPolicy { base_ms: 1000, factor: 2.0, max_ms: 20 * 60 * 1000, jitter: true };
        for attempts in 0..5 {
            let delay = policy.delay_ms(attempts);
            let cap = policy.delay_ms_unjittered(attempts);
            assert!(delay <= cap);
        }
    }

    impl BackoffPolicy {
        fn delay_ms_unjittered(&self, attempts: u32) -> u64 {
            let raw = self.base_ms as f64 * self.factor.powi(attempts as i32);
            raw.min(self.max_ms as f64) as u64
        }
    }
}
