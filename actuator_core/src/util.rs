//! Tick helpers shared by the runner and the CLI.

use std::time::Duration;

/// Ticks needed to cover `span` at `tick`, rounded up. A zero tick yields 0.
#[inline]
pub fn ticks_for(span: Duration, tick: Duration) -> u64 {
    let tick_ns = tick.as_nanos();
    if tick_ns == 0 {
        return 0;
    }
    let n = span.as_nanos().div_ceil(tick_ns);
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Time remaining in a tick after `spent`, or zero when the deadline was missed.
#[inline]
pub fn remaining_in_tick(tick: Duration, spent: Duration) -> Duration {
    tick.saturating_sub(spent)
}
