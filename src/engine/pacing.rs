//! Interval compensation.

use std::time::Duration;

/// Time left to wait so that an iteration which took `elapsed` lasts
/// `interval` in total. `None` when there is nothing left to wait.
pub fn remaining(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|wait| !wait.is_zero())
}

/// An iteration overran when it was paced and used up its whole interval
pub fn overran(interval: Duration, elapsed: Duration) -> bool {
    !interval.is_zero() && elapsed >= interval
}
