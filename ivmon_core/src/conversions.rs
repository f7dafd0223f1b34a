//! `From` implementations bridging `ivmon_config` types to `ivmon_core` types.

use std::time::Duration;

use crate::config::{
    CalibrationSettings, IndicatorSettings, MonitorSettings, ReadingCounts, StationSettings,
};

// ── ReadingCounts ────────────────────────────────────────────────────────────

impl From<&ivmon_config::Readings> for ReadingCounts {
    fn from(r: &ivmon_config::Readings) -> Self {
        Self {
            average: r.average,
            tare: r.tare,
            calibration: r.calibration,
            verification: r.verification,
            measurement: r.measurement,
        }
    }
}

// ── StationSettings ──────────────────────────────────────────────────────────

impl From<&ivmon_config::Config> for StationSettings {
    fn from(c: &ivmon_config::Config) -> Self {
        let cal = &c.calibration;
        Self {
            calibration: CalibrationSettings {
                readings: ReadingCounts::from(&c.readings),
                max_attempts: cal.max_attempts,
                acceptable_error_pct: cal.acceptable_error_pct,
                excellent_error_pct: cal.excellent_error_pct,
                quick_verify_max_error_pct: cal.quick_verify_max_error_pct,
                min_raw_reading: cal.min_raw_reading,
                max_zero_drift_g: cal.max_zero_drift_g,
                stabilization: Duration::from_millis(cal.stabilization_ms),
                settle: Duration::from_millis(cal.settle_ms),
                hw_min_counts: cal.hw_min_counts,
                hw_saturation_counts: cal.hw_saturation_counts,
                tare_unstable_counts: cal.tare_unstable_counts,
            },
            monitor: MonitorSettings {
                average_readings: c.readings.average,
                interval: Duration::from_millis(c.monitor.interval_ms),
                window: c.monitor.moving_average_size,
                min_stable_weight_g: c.monitor.min_stable_weight_g,
            },
            indicators: IndicatorSettings {
                low_limit_g: c.monitor.low_limit_g,
                blink_half_period: Duration::from_millis(c.indicators.blink_half_period_ms),
            },
        }
    }
}
