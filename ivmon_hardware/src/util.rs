use std::time::Duration;

use ivmon_traits::{CancelToken, Clock};

use crate::error::{HwError, Result};

/// Poll `is_high` until it reports a low line, for at most `polls` attempts
/// spaced `poll_interval` apart (the HX711 pulls DOUT low when a conversion
/// is ready).
///
/// Returns `DataReadyTimeout` when the budget is spent and `Interrupted` as
/// soon as `cancel` fires. Errors from `is_high` are propagated unchanged.
pub fn wait_until_low(
    mut is_high: impl FnMut() -> Result<bool>,
    polls: u32,
    poll_interval: Duration,
    clock: &dyn Clock,
    cancel: Option<&CancelToken>,
) -> Result<()> {
    for _ in 0..polls.max(1) {
        if !is_high()? {
            return Ok(());
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(HwError::Interrupted);
        }
        clock.sleep(poll_interval);
    }
    // One last look after the final sleep.
    if !is_high()? {
        return Ok(());
    }
    Err(HwError::DataReadyTimeout)
}
