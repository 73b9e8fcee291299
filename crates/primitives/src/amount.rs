use alloy_primitives::U256;
use serde_json::Value;

/// Converts an atomic integer amount into a fixed-point decimal string with
/// `decimals` fractional digits, trailing zeros trimmed and no trailing dot.
///
/// `decimals = 0` yields the bare integer. `U256` cannot represent a negative
/// value, so this function never fails.
pub fn format_atomic(atomic: U256, decimals: u8) -> String {
    if decimals == 0 {
        return atomic.to_string();
    }

    let scale = pow10(decimals);
    let int_part = atomic / scale;
    let frac_part = atomic % scale;

    if frac_part.is_zero() {
        return int_part.to_string();
    }

    let mut frac_str = frac_part.to_string();
    let pad = decimals as usize - frac_str.len();
    if pad > 0 {
        frac_str.insert_str(0, &"0".repeat(pad));
    }
    let trimmed = frac_str.trim_end_matches('0');
    format!("{int_part}.{trimmed}")
}

/// Parses a decimal string (integer or fixed-point form) into an atomic
/// `U256`, scaling by `10^decimals`. Returns `None` for negative, empty,
/// non-numeric, or over-precise (more than `decimals` fraction digits) input.
pub fn parse_atomic(s: &str, decimals: u8) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.is_empty() && !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac_part.is_empty() && !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > decimals as usize {
        return None;
    }

    let int_val = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).ok()?
    };

    let mut atomic = int_val.checked_mul(pow10(decimals))?;

    if !frac_part.is_empty() {
        let mut padded = frac_part.to_string();
        padded.push_str(&"0".repeat(decimals as usize - frac_part.len()));
        let frac_val = U256::from_str_radix(&padded, 10).ok()?;
        atomic = atomic.checked_add(frac_val)?;
    }

    Some(atomic)
}

/// Normalizes a decimal string to the canonical form `format_atomic` would
/// produce for it (used by the round-trip property test): trims a leading
/// `+`, collapses a bare trailing dot, and strips trailing fraction zeros.
pub fn normalize_decimal(s: &str) -> Option<String> {
    let s = s.trim().strip_prefix('+').unwrap_or(s.trim());
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let trimmed_frac = frac_part.trim_end_matches('0');
    if trimmed_frac.is_empty() {
        Some(int_part.to_string())
    } else {
        Some(format!("{int_part}.{trimmed_frac}"))
    }
}

/// Formats a raw JSON amount value (as seen in wallet RPC / webhook
/// payloads, which may arrive as a JSON number or a numeric string) as a
/// decimal string. Negative or non-finite numbers yield `None`, matching the
/// amount codec's documented edge-case behavior.
pub fn try_format_raw_amount(value: &Value, decimals: u8) -> Option<String> {
    let atomic = match value {
        Value::String(s) => parse_atomic_integer(s)?,
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                U256::from(u)
            } else if let Some(i) = n.as_i64() {
                if i < 0 {
                    return None;
                }
                U256::from(i as u64)
            } else {
                // Non-finite (NaN/Infinity) floats are not representable by
                // serde_json::Number as f64 literals here, but a fractional
                // float with no exact atomic representation is rejected too.
                return None;
            }
        }
        _ => return None,
    };
    Some(format_atomic(atomic, decimals))
}

fn parse_atomic_integer(s: &str) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() || s.starts_with('-') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(s, 10).ok()
}

fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}
