use std::time::Duration;

/// Largest exponent applied to the base delay. Beyond it the delay saturates
/// at `Duration::MAX` instead of wrapping.
const MAX_EXPONENT: u32 = 31;

/// Delay to sleep after failed attempt `attempt` (1-based) before the next one:
/// `base * 2^(attempt - 1)`.
///
/// Attempt 0 has no predecessor and yields zero.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let exp = attempt - 1;
    if exp > MAX_EXPONENT {
        return Duration::MAX;
    }
    base.checked_mul(1u32 << exp).unwrap_or(Duration::MAX)
}
