//! Orchestrates hardware check, calibration and monitoring, and owns
//! teardown.
use ivmon_traits::{Adc, Clock, OutputLine};
use tracing::{info, warn};

use crate::calibration::CalibrationState;
use crate::calibrator::{CalibrationEngine, CalibrationOutcome};
use crate::config::StationSettings;
use crate::error::CalibrationFailure;
use crate::indicator::IndicatorController;
use crate::monitor::{Monitor, MonitorSummary};
use crate::operator::Operator;
use crate::sampler::SampleAggregator;
use crate::transmit::ReadingSink;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub calibration: CalibrationOutcome,
    pub monitor: MonitorSummary,
}

pub struct Station<A: Adc, C: Clock, O: OutputLine + Send + 'static> {
    agg: SampleAggregator<A, C>,
    indicators: IndicatorController<O>,
    sink: Box<dyn ReadingSink + Send>,
    settings: StationSettings,
    released: bool,
}

impl<A: Adc, C: Clock, O: OutputLine + Send + 'static> Station<A, C, O> {
    pub fn new(
        agg: SampleAggregator<A, C>,
        indicators: IndicatorController<O>,
        sink: Box<dyn ReadingSink + Send>,
        settings: StationSettings,
    ) -> Self {
        Self {
            agg,
            indicators,
            sink,
            settings,
            released: false,
        }
    }

    /// Hardware check only.
    pub fn self_check(&mut self, op: &mut dyn Operator) -> Result<i32, CalibrationFailure> {
        CalibrationEngine::new(&mut self.agg, op, &self.settings.calibration).hardware_check()
    }

    /// Run calibration with the calibration light blinking. The blink is
    /// stopped on every exit path before this returns.
    pub fn calibrate(
        &mut self,
        op: &mut dyn Operator,
    ) -> Result<CalibrationOutcome, CalibrationFailure> {
        self.indicators.start_calibration_blink();
        let result =
            CalibrationEngine::new(&mut self.agg, op, &self.settings.calibration).run();
        self.indicators.stop_calibration_blink();
        match &result {
            Ok(outcome) => info!(scale = outcome.state.scale, "calibration successful"),
            Err(e) => warn!(error = %e, "calibration failed"),
        }
        result
    }

    pub fn monitor(
        &mut self,
        calibration: CalibrationState,
        max_cycles: Option<u64>,
    ) -> MonitorSummary {
        Monitor::new(
            &mut self.agg,
            &mut self.indicators,
            &mut *self.sink,
            calibration,
            self.settings.monitor.clone(),
        )
        .run(max_cycles)
    }

    /// Calibrate, then monitor until cancelled or `max_cycles` is reached.
    pub fn run(
        &mut self,
        op: &mut dyn Operator,
        max_cycles: Option<u64>,
    ) -> Result<RunReport, CalibrationFailure> {
        let calibration = self.calibrate(op)?;
        op.tell("\n============================================================");
        op.tell("[STEP 3] CONTINUOUS MEASUREMENT");
        op.tell("============================================================");
        op.tell("Press Ctrl+C to exit\n");
        let monitor = self.monitor(calibration.state, max_cycles);
        Ok(RunReport {
            calibration,
            monitor,
        })
    }

    /// Release hardware to a safe idle state: blink stopped, every light
    /// off, converter powered down. Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.indicators.all_off();
        if let Err(e) = self.agg.power_down() {
            warn!(error = %e, "HX711 power-down failed");
        }
        info!("hardware released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<A: Adc, C: Clock, O: OutputLine + Send + 'static> Drop for Station<A, C, O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
