//! Continuous measurement after calibration.
use ivmon_traits::{Adc, Clock, OutputLine};
use tracing::{info, warn};

use crate::calibration::CalibrationState;
use crate::config::MonitorSettings;
use crate::error::AcquireError;
use crate::indicator::IndicatorController;
use crate::sampler::SampleAggregator;
use crate::smoothing::MovingAverage;
use crate::status::{AlertState, WeightStatus};
use crate::transmit::ReadingSink;

/// What one cycle observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub raw_avg: f64,
    pub weight_g: f64,
    pub smoothed_g: f64,
    pub status: WeightStatus,
    pub alert: AlertState,
    /// `None` when transmission is disabled.
    pub sent: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Cycles that produced a reading.
    pub cycles: u64,
    /// Cycles dropped because the sensor could not be read.
    pub skipped: u64,
    pub sent: u64,
    pub unsent: u64,
    /// Whether readings were forwarded at all.
    pub transmitting: bool,
    pub interrupted: bool,
}

pub struct Monitor<'a, A, C, O: OutputLine + Send + 'static> {
    agg: &'a mut SampleAggregator<A, C>,
    indicators: &'a mut IndicatorController<O>,
    sink: &'a mut dyn ReadingSink,
    calibration: CalibrationState,
    settings: MonitorSettings,
    window: MovingAverage,
    last_status: Option<WeightStatus>,
}

impl<'a, A: Adc, C: Clock, O: OutputLine + Send + 'static> Monitor<'a, A, C, O> {
    pub fn new(
        agg: &'a mut SampleAggregator<A, C>,
        indicators: &'a mut IndicatorController<O>,
        sink: &'a mut dyn ReadingSink,
        calibration: CalibrationState,
        settings: MonitorSettings,
    ) -> Self {
        let window = MovingAverage::new(settings.window);
        Self {
            agg,
            indicators,
            sink,
            calibration,
            settings,
            window,
            last_status: None,
        }
    }

    /// Read, convert, smooth, classify, then drive the lights and the sink.
    pub fn cycle(&mut self) -> Result<CycleReport, AcquireError> {
        let raw_avg = self.agg.read_average(self.settings.average_readings)?;
        let weight_g = self.calibration.units(raw_avg);
        let smoothed_g = self.window.push(weight_g);
        let status = WeightStatus::classify(smoothed_g, self.settings.min_stable_weight_g);

        if self.last_status != Some(status) {
            match status {
                WeightStatus::Negative => warn!(smoothed_g, "negative weight; check tare"),
                WeightStatus::Empty => info!(smoothed_g, "scale empty"),
                WeightStatus::Normal => info!(smoothed_g, "weight on scale"),
            }
            self.last_status = Some(status);
        }
        info!(
            weight_g = smoothed_g,
            %status,
            "Weight: {smoothed_g:8.2} g {status}"
        );

        let alert = self.indicators.control_lights(smoothed_g);
        let sent = self
            .sink
            .is_enabled()
            .then(|| self.sink.send(smoothed_g));
        Ok(CycleReport {
            raw_avg,
            weight_g,
            smoothed_g,
            status,
            alert,
            sent,
        })
    }

    /// Repeat `cycle` at the configured cadence until cancelled or until
    /// `max_cycles` cycles (counting skipped ones) have run.
    pub fn run(&mut self, max_cycles: Option<u64>) -> MonitorSummary {
        let mut summary = MonitorSummary {
            transmitting: self.sink.is_enabled(),
            ..MonitorSummary::default()
        };
        let mut attempted = 0u64;
        info!(
            interval_ms = self.settings.interval.as_millis() as u64,
            window = self.settings.window,
            "monitoring started"
        );

        loop {
            if self.agg.cancel_token().is_cancelled() {
                summary.interrupted = true;
                break;
            }
            match self.cycle() {
                Ok(report) => {
                    summary.cycles += 1;
                    match report.sent {
                        Some(true) => summary.sent += 1,
                        Some(false) => summary.unsent += 1,
                        None => {}
                    }
                }
                Err(AcquireError::Interrupted) => {
                    summary.interrupted = true;
                    break;
                }
                Err(e) => {
                    summary.skipped += 1;
                    warn!(error = %e, "skipping cycle");
                }
            }
            attempted += 1;
            if max_cycles.is_some_and(|max| attempted >= max) {
                break;
            }
            if !self.agg.pause(self.settings.interval) {
                summary.interrupted = true;
                break;
            }
        }
        info!(?summary, "monitoring stopped");
        summary
    }

    pub fn window(&self) -> &MovingAverage {
        &self.window
    }
}
