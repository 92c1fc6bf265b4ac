//! Exponential reconnect backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Delay before reconnect attempt `attempt` (1-based).
///
/// Doubles from `base_ms` per attempt, capped at `max_ms`, plus up to 10%
/// jitter so a fleet of bridges does not hammer a restarted broker in lockstep.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let capped = base_ms.saturating_mul(factor).min(max_ms.max(base_ms));

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
