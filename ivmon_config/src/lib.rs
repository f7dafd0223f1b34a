#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the IV bag monitor.
//!
//! Every section is optional and falls back to the bench defaults, so an
//! empty file is a valid config. `Config::validate` rejects values the
//! runtime cannot work with and names the offending key.
use std::path::Path;

use serde::Deserialize;

/// BCM pin numbers.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    /// Red light, lit at or below the low limit.
    pub low_light: u8,
    /// Green light, lit above the low limit.
    pub ok_light: u8,
    /// Blinks while calibration is in progress.
    pub calibration_light: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dt: 17,
            hx711_sck: 27,
            low_light: 21,
            ok_light: 20,
            calibration_light: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hx711Cfg {
    /// 128 or 64 (channel A) or 32 (channel B)
    pub gain: u32,
    /// Data-ready polls before a read is abandoned
    pub ready_polls: u32,
    pub ready_poll_ms: u64,
    /// Pause between consecutive reads inside one average
    pub inter_read_ms: u64,
    /// Settle time after power-up
    pub settle_ms: u64,
}

impl Default for Hx711Cfg {
    fn default() -> Self {
        Self {
            gain: 128,
            ready_polls: 1000,
            ready_poll_ms: 1,
            inter_read_ms: 10,
            settle_ms: 500,
        }
    }
}

/// Samples per average for each phase.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Readings {
    /// Monitoring loop
    pub average: usize,
    /// Re-tare during verification
    pub tare: usize,
    /// Initial tare and weight calibration
    pub calibration: usize,
    /// Empty-scale check during verification
    pub verification: usize,
    /// Loaded-scale check during verification
    pub measurement: usize,
}

impl Default for Readings {
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationCfg {
    pub max_attempts: u32,
    pub acceptable_error_pct: f64,
    pub excellent_error_pct: f64,
    /// Saved-factor mode fails above this error
    pub quick_verify_max_error_pct: f64,
    /// Minimum raw delta that counts as a detectable weight
    pub min_raw_reading: f64,
    pub max_zero_drift_g: f64,
    pub stabilization_ms: u64,
    /// Wait after each operator action during verification
    pub settle_ms: u64,
    /// Hardware check: below this magnitude the cell is presumed disconnected
    pub hw_min_counts: i32,
    /// Hardware check: above this magnitude the ADC is presumed saturated
    pub hw_saturation_counts: i32,
    /// Post-tare residual above which the zero point is reported unstable
    pub tare_unstable_counts: f64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            acceptable_error_pct: 10.0,
            excellent_error_pct: 5.0,
            quick_verify_max_error_pct: 15.0,
            min_raw_reading: 100.0,
            max_zero_drift_g: 20.0,
            stabilization_ms: 3000,
            settle_ms: 2000,
            hw_min_counts: 50,
            hw_saturation_counts: 16_000_000,
            tare_unstable_counts: 1000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorCfg {
    pub interval_ms: u64,
    pub moving_average_size: usize,
    /// Smoothed weights closer to zero than this read as an empty scale
    pub min_stable_weight_g: f64,
    /// Low-weight alert threshold (inclusive)
    pub low_limit_g: f64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            moving_average_size: 5,
            min_stable_weight_g: 5.0,
            low_limit_g: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndicatorCfg {
    pub blink_half_period_ms: u64,
}

impl Default for IndicatorCfg {
    fn default() -> Self {
        Self {
            blink_half_period_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectorCfg {
    /// POST target; readings are not transmitted when absent
    pub url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for CollectorCfg {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub hx711: Hx711Cfg,
    pub readings: Readings,
    pub calibration: CalibrationCfg,
    pub monitor: MonitorCfg,
    pub indicators: IndicatorCfg,
    pub collector: CollectorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let p = &self.pins;
        let all = [
            ("pins.hx711_dt", p.hx711_dt),
            ("pins.hx711_sck", p.hx711_sck),
            ("pins.low_light", p.low_light),
            ("pins.ok_light", p.ok_light),
            ("pins.calibration_light", p.calibration_light),
        ];
        for (i, (name_a, a)) in all.iter().enumerate() {
            if *a > 27 {
                eyre::bail!("{name_a} must be a BCM pin in 0..=27, got {a}");
            }
            for (name_b, b) in &all[i + 1..] {
                if a == b {
                    eyre::bail!("{name_a} and {name_b} both use pin {a}");
                }
            }
        }

        // HX711
        if !matches!(self.hx711.gain, 128 | 64 | 32) {
            eyre::bail!("hx711.gain must be one of 128, 64, 32");
        }
        if self.hx711.ready_polls == 0 {
            eyre::bail!("hx711.ready_polls must be >= 1");
        }
        if self.hx711.ready_poll_ms == 0 {
            eyre::bail!("hx711.ready_poll_ms must be >= 1");
        }

        // Readings
        let r = &self.readings;
        for (name, n) in [
            ("readings.average", r.average),
            ("readings.tare", r.tare),
            ("readings.calibration", r.calibration),
            ("readings.verification", r.verification),
            ("readings.measurement", r.measurement),
        ] {
            if n == 0 {
                eyre::bail!("{name} must be >= 1");
            }
        }

        // Calibration
        let c = &self.calibration;
        if c.max_attempts == 0 {
            eyre::bail!("calibration.max_attempts must be >= 1");
        }
        if !(c.excellent_error_pct > 0.0) {
            eyre::bail!("calibration.excellent_error_pct must be > 0");
        }
        if c.excellent_error_pct > c.acceptable_error_pct {
            eyre::bail!("calibration.excellent_error_pct must be <= acceptable_error_pct");
        }
        if !(c.quick_verify_max_error_pct > 0.0) {
            eyre::bail!("calibration.quick_verify_max_error_pct must be > 0");
        }
        if c.min_raw_reading < 0.0 {
            eyre::bail!("calibration.min_raw_reading must be >= 0");
        }
        if c.max_zero_drift_g < 0.0 {
            eyre::bail!("calibration.max_zero_drift_g must be >= 0");
        }
        if c.hw_min_counts < 0 || c.hw_saturation_counts <= c.hw_min_counts {
            eyre::bail!("calibration.hw_min_counts must be >= 0 and below hw_saturation_counts");
        }

        // Monitor
        let m = &self.monitor;
        if m.interval_ms == 0 {
            eyre::bail!("monitor.interval_ms must be >= 1");
        }
        if m.moving_average_size == 0 {
            eyre::bail!("monitor.moving_average_size must be >= 1");
        }
        if m.min_stable_weight_g < 0.0 {
            eyre::bail!("monitor.min_stable_weight_g must be >= 0");
        }
        if !m.low_limit_g.is_finite() {
            eyre::bail!("monitor.low_limit_g must be finite");
        }

        // Indicators
        if self.indicators.blink_half_period_ms == 0 {
            eyre::bail!("indicators.blink_half_period_ms must be >= 1");
        }

        // Collector
        if let Some(url) = &self.collector.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            eyre::bail!("collector.url must start with http:// or https://");
        }
        if self.collector.timeout_ms == 0 {
            eyre::bail!("collector.timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
