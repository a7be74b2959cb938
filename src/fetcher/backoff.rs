use rand::Rng;
use std::time::Duration;

const MIN_JITTER: f64 = 1.0;
const MAX_JITTER: f64 = 3.0;

/// Delay before the next fetch attempt: `base` scaled by a uniform factor in `[1, 3]`.
pub fn retry_delay(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(MIN_JITTER..=MAX_JITTER);
    base.mul_f64(factor)
}
