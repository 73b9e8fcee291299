use alloy_primitives::U256;

/// Dynamic minimum-confirmations tier for a deposit, based on its atomic
/// amount scaled by the ticker's `decimals`. A step function with exactly
/// two breakpoints, at `50 * 10^decimals` and `100 * 10^decimals`:
///
/// - `< 50 * 10^decimals`  -> 1 confirmation
/// - `< 100 * 10^decimals` -> 3 confirmations
/// - `>= 100 * 10^decimals` -> 6 confirmations
///
/// Intended to be applied exactly once per job, the first time any
/// observation is reported for it (see the job state machine).
pub fn dynamic_min_conf(atomic: U256, decimals: u8) -> u32 {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let low = scale.saturating_mul(U256::from(50u64));
    let high = scale.saturating_mul(U256::from(100u64));

    if atomic < low {
        1
    } else if atomic < high {
        3
    } else {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_one_below_fifty() {
        assert_eq!(dynamic_min_conf(U256::from(10u64) * U256::from(10u64).pow(U256::from(12u64)), 12), 1);
    }

    #[test]
    fn picks_three_between_fifty_and_hundred() {
        assert_eq!(dynamic_min_conf(U256::from(60u64) * U256::from(10u64).pow(U256::from(12u64)), 12), 3);
    }

    #[test]
    fn picks_six_at_or_above_hundred() {
        assert_eq!(dynamic_min_conf(U256::from(100u64) * U256::from(10u64).pow(U256::from(12u64)), 12), 6);
        assert_eq!(dynamic_min_conf(U256::from(1_000u64) * U256::from(10u64).pow(U256::from(12u64)), 12), 6);
    }

    #[test]
    fn breakpoints_are_exact() {
        let scale = U256::from(10u64).pow(U256::from(6u64));
        assert_eq!(dynamic_min_conf(scale * U256::from(49u64), 6), 1);
        assert_eq!(dynamic_min_conf(scale * U256::from(50u64), 6), 3);
        assert_eq!(dynamic_min_conf(scale * U256::from(99u64), 6), 3);
        assert_eq!(dynamic_min_conf(scale * U256::from(100u64), 6), 6);
    }
}
