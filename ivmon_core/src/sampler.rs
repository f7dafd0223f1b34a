//! Sample aggregation on top of a raw ADC.
//!
//! `SampleAggregator` owns the `Adc` and the `Clock`, retries transient bad
//! reads within a bounded budget, trims outliers and averages the rest. It is
//! also the single place where the inter-read and phase waits happen, so
//! every wait observes the shared `CancelToken`.
use std::time::Duration;

use ivmon_traits::{Adc, CancelToken, Clock};

use crate::error::AcquireError;
use crate::hw_error::map_hw_error;

/// Extra reads allowed on top of the requested count.
pub const EXTRA_READS: usize = 5;

/// Sort `values`, drop `len / 5` from each end when at least five samples are
/// present, and average what is left.
///
/// Returns `None` for an empty slice.
pub fn trimmed_mean(values: &mut [i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let trim = if values.len() >= 5 { values.len() / 5 } else { 0 };
    let kept = &values[trim..values.len() - trim];
    let sum: i64 = kept.iter().map(|&v| i64::from(v)).sum();
    Some(sum as f64 / kept.len() as f64)
}

pub struct SampleAggregator<A, C> {
    adc: A,
    clock: C,
    inter_read: Duration,
    cancel: CancelToken,
}

impl<A: Adc, C: Clock> SampleAggregator<A, C> {
    pub fn new(adc: A, clock: C, inter_read: Duration) -> Self {
        Self {
            adc,
            clock,
            inter_read,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// One raw conversion. A not-ready chip is `AcquireError::NotReady`.
    pub fn read_once(&mut self) -> Result<i32, AcquireError> {
        if self.cancel.is_cancelled() {
            return Err(AcquireError::Interrupted);
        }
        self.adc.read_raw().map_err(|e| map_hw_error(&*e))
    }

    /// Average `n` good reads (at least one).
    ///
    /// Up to `n + EXTRA_READS` reads are attempted. A not-ready timeout and a
    /// literal zero both count as bad reads; once more than `n / 2` have been
    /// seen the call gives up with `SensorUnusable`.
    pub fn read_average(&mut self, n: usize) -> Result<f64, AcquireError> {
        let n = n.max(1);
        let mut values = Vec::with_capacity(n);
        let mut bad_reads = 0usize;

        for _ in 0..n + EXTRA_READS {
            match self.read_once() {
                Ok(0) | Err(AcquireError::NotReady) => {
                    bad_reads += 1;
                    if bad_reads > n / 2 {
                        tracing::error!(
                            bad_reads,
                            requested = n,
                            "too many failed reads; check connections"
                        );
                        return Err(AcquireError::SensorUnusable {
                            bad_reads,
                            requested: n,
                        });
                    }
                    continue;
                }
                Ok(v) => values.push(v),
                Err(e) => return Err(e),
            }
            if values.len() >= n {
                break;
            }
            if !self.pause(self.inter_read) {
                return Err(AcquireError::Interrupted);
            }
        }

        let got = values.len();
        let mean = trimmed_mean(&mut values).ok_or(AcquireError::SensorUnusable {
            bad_reads,
            requested: n,
        })?;
        tracing::debug!(requested = n, got, bad_reads, mean, "aggregated reading");
        Ok(mean)
    }

    /// Sleep on the aggregator's clock; `false` means cancelled.
    pub fn pause(&self, d: Duration) -> bool {
        self.cancel.sleep(&self.clock, d)
    }

    pub fn power_down(&mut self) -> Result<(), AcquireError> {
        self.adc.power_down().map_err(|e| map_hw_error(&*e))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
