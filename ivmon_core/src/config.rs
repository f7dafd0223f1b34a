//! Runtime settings used by the core.
//!
//! These are separate from the TOML-deserialized config in `ivmon_config`;
//! durations are already `Duration`s and `conversions` maps one onto the other.

use std::time::Duration;

/// Samples averaged per phase.
#[derive(Debug, Clone)]
pub struct ReadingCounts {
    pub average: usize,
    pub tare: usize,
    pub calibration: usize,
    pub verification: usize,
    pub measurement: usize,
}

impl Default for ReadingCounts {
    fn default() -> Self {
        Self {
            average: 3,
            tare: 15,
            calibration: 20,
            verification: 10,
            measurement: 15,
        }
    }
}

/// Thresholds and waits for the operator-guided calibration.
#[derive(Debug, Clone)]
pub struct CalibrationSettings {
    pub readings: ReadingCounts,
    pub max_attempts: u32,
    pub acceptable_error_pct: f64,
    pub excellent_error_pct: f64,
    pub quick_verify_max_error_pct: f64,
    /// Offset-corrected counts below this mean "nothing was placed".
    pub min_raw_reading: f64,
    pub max_zero_drift_g: f64,
    /// Wait between placing the reference weight and measuring it.
    pub stabilization: Duration,
    /// Wait after each operator action during verification.
    pub settle: Duration,
    pub hw_min_counts: i32,
    pub hw_saturation_counts: i32,
    pub tare_unstable_counts: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            readings: ReadingCounts::default(),
            max_attempts: 3,
            acceptable_error_pct: 10.0,
            excellent_error_pct: 5.0,
            quick_verify_max_error_pct: 15.0,
            min_raw_reading: 100.0,
            max_zero_drift_g: 20.0,
            stabilization: Duration::from_secs(3),
            settle: Duration::from_secs(2),
            hw_min_counts: 50,
            hw_saturation_counts: 16_000_000,
            tare_unstable_counts: 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Samples per cycle.
    pub average_readings: usize,
    pub interval: Duration,
    pub window: usize,
    pub min_stable_weight_g: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            average_readings: 3,
            interval: Duration::from_millis(500),
            window: 5,
            min_stable_weight_g: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSettings {
    /// Inclusive: a weight equal to the limit raises the alert.
    pub low_limit_g: f64,
    pub blink_half_period: Duration,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            low_limit_g: 50.0,
            blink_half_period: Duration::from_millis(500),
        }
    }
}

/// Everything the orchestrator needs besides hardware handles.
#[derive(Debug, Clone, Default)]
pub struct StationSettings {
    pub calibration: CalibrationSettings,
    pub monitor: MonitorSettings,
    pub indicators: IndicatorSettings,
}
