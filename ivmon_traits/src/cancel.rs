//! Cooperative cancellation shared between the Ctrl-C handler and every
//! blocking point (ready poll, inter-read sleep, prompts, cadence sleep).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clock::Clock;

/// Longest single sleep slice; bounds how late a cancellation is observed.
pub const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleep for `d` in slices, returning `false` as soon as cancellation is
    /// observed and `true` if the full duration elapsed.
    pub fn sleep(&self, clock: &dyn Clock, d: Duration) -> bool {
        let mut left = d;
        while !left.is_zero() {
            if self.is_cancelled() {
                return false;
            }
            let step = left.min(SLEEP_SLICE);
            clock.sleep(step);
            left -= step;
        }
        !self.is_cancelled()
    }
}
