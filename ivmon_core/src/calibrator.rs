//! Operator-guided calibration.
//!
//! The engine is an explicit state machine:
//!
//! ```text
//! HardwareCheck -> ChoiceOfMode -+-> Tare -> WeightCalibration <-> Verification -> Done
//!                                +-> SavedFactorQuickVerify ---------------------> Done
//! ```
//!
//! Every transition is recorded in [`CalibrationEngine::phases`]. All operator
//! interaction goes through an [`Operator`], all reads through the
//! [`SampleAggregator`], and every wait is cancellable.
use std::time::Duration;

use ivmon_traits::{Adc, Clock};
use tracing::{debug, info, warn};

use crate::calibration::CalibrationState;
use crate::config::CalibrationSettings;
use crate::error::{CalibrationFailure, WiringFault};
use crate::operator::{Operator, confirm};
use crate::sampler::SampleAggregator;

/// Samples used for the quick zero checks after a tare.
const ZERO_CHECK_READINGS: usize = 5;
/// Pause after a re-tare before asking for the reference weight.
const RETARE_PAUSE: Duration = Duration::from_secs(1);

const RULE: &str = "============================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    HardwareCheck,
    ChoiceOfMode,
    Tare,
    WeightCalibration,
    Verification,
    SavedFactorQuickVerify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMode {
    Full,
    SavedFactor,
}

/// Result of a verification measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Retry,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub state: CalibrationState,
    pub mode: CalibrationMode,
    /// Weight-calibration attempts used (0 in saved-factor mode).
    pub attempts: u32,
}

enum Step {
    HardwareCheck,
    ChoiceOfMode,
    Tare,
    WeightCalibration { attempt: u32 },
    Verification { attempt: u32, known_g: f64 },
    QuickVerify { factor: f64 },
    Done { mode: CalibrationMode, attempts: u32 },
}

pub struct CalibrationEngine<'a, A, C> {
    agg: &'a mut SampleAggregator<A, C>,
    op: &'a mut dyn Operator,
    settings: &'a CalibrationSettings,
    state: CalibrationState,
    phases: Vec<Phase>,
}

impl<'a, A: Adc, C: Clock> CalibrationEngine<'a, A, C> {
    pub fn new(
        agg: &'a mut SampleAggregator<A, C>,
        op: &'a mut dyn Operator,
        settings: &'a CalibrationSettings,
    ) -> Self {
        Self {
            agg,
            op,
            settings,
            state: CalibrationState::default(),
            phases: Vec::new(),
        }
    }

    /// Phases entered so far, in order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Drive the state machine to completion.
    pub fn run(&mut self) -> Result<CalibrationOutcome, CalibrationFailure> {
        let mut step = Step::HardwareCheck;
        loop {
            step = match step {
                Step::HardwareCheck => {
                    self.hardware_check()?;
                    Step::ChoiceOfMode
                }
                Step::ChoiceOfMode => self.choose_mode()?,
                Step::Tare => {
                    self.full_tare()?;
                    Step::WeightCalibration { attempt: 1 }
                }
                Step::WeightCalibration { attempt } => self.weight_calibration(attempt)?,
                Step::Verification { attempt, known_g } => {
                    match self.verify(attempt, known_g)? {
                        (Verdict::Accept, _) => Step::Done {
                            mode: CalibrationMode::Full,
                            attempts: attempt,
                        },
                        (Verdict::Retry, _) => Step::WeightCalibration {
                            attempt: attempt + 1,
                        },
                        (Verdict::Reject, error_pct) => {
                            return Err(CalibrationFailure::Rejected { error_pct });
                        }
                    }
                }
                Step::QuickVerify { factor } => {
                    self.quick_verify(factor)?;
                    Step::Done {
                        mode: CalibrationMode::SavedFactor,
                        attempts: 0,
                    }
                }
                Step::Done { mode, attempts } => {
                    if mode == CalibrationMode::Full {
                        self.op.tell(&format!(
                            "\nCalibration complete! Scale factor: {:.2}",
                            self.state.scale
                        ));
                        self.op
                            .tell("  You can hardcode this value to skip calibration next time.");
                    }
                    info!(
                        offset = self.state.offset,
                        scale = self.state.scale,
                        ?mode,
                        attempts,
                        "calibration complete"
                    );
                    return Ok(CalibrationOutcome {
                        state: self.state,
                        mode,
                        attempts,
                    });
                }
            };
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(?phase, "calibration phase");
        self.phases.push(phase);
    }

    fn pause(&self, d: Duration) -> Result<(), CalibrationFailure> {
        if self.agg.pause(d) {
            Ok(())
        } else {
            Err(CalibrationFailure::Interrupted)
        }
    }

    /// One raw read; too small a magnitude means the bridge is not connected.
    pub fn hardware_check(&mut self) -> Result<i32, CalibrationFailure> {
        self.enter(Phase::HardwareCheck);
        self.op.tell("\n[HARDWARE TEST]");
        let raw = self.agg.read_once()?;
        self.op.tell(&format!("Raw reading: {raw}"));

        if raw.unsigned_abs() < self.settings.hw_min_counts.unsigned_abs() {
            for line in [
                "\nERROR: Raw value too low!",
                "This indicates load cell is not connected or wired incorrectly.",
                "\nCheck your wiring:",
                "  Load Cell -> HX711",
                "  Red    -> E+",
                "  Black  -> E-",
                "  White  -> A+ (or S+)",
                "  Green  -> A- (or S-)",
                "\nIf colors are different, refer to load cell datasheet.",
            ] {
                self.op.tell(line);
            }
            tracing::error!(raw, "hardware check failed: no signal from load cell");
            return Err(WiringFault::NoSignal { raw }.into());
        }

        if raw.unsigned_abs() > self.settings.hw_saturation_counts.unsigned_abs() {
            self.op.tell("\nWARNING: Value at extreme range");
            self.op.tell("Load cell might be under stress or wrong gain selected.");
            warn!(raw, "hardware check: reading near full scale");
        }
        Ok(raw)
    }

    fn choose_mode(&mut self) -> Result<Step, CalibrationFailure> {
        self.enter(Phase::ChoiceOfMode);
        self.op.tell(&format!("\n{RULE}"));
        self.op.tell("CALIBRATION OPTIONS");
        self.op.tell(RULE);
        self.op.tell("1. Full calibration (recommended for first time)");
        self.op.tell("2. Use saved scale factor (if you have one)");
        let choice = self.op.ask("\nEnter choice (1 or 2): ")?;
        if choice.trim() != "2" {
            return Ok(Step::Tare);
        }

        let answer = self.op.ask("Enter your saved scale factor: ")?;
        match answer.trim().parse::<f64>() {
            Ok(factor) if factor.is_finite() && factor != 0.0 => {
                self.op.tell(&format!("Using scale factor: {factor:.2}"));
                Ok(Step::QuickVerify { factor })
            }
            _ => {
                self.op.tell("Invalid input, proceeding with full calibration...");
                warn!(input = %answer.trim(), "unusable saved scale factor");
                Ok(Step::Tare)
            }
        }
    }

    /// Average `n` samples into the offset, guarding against a dead bridge.
    fn tare(&mut self, n: usize) -> Result<(), CalibrationFailure> {
        self.op.tell("Reading baseline...");
        let avg = self.agg.read_average(n)?;
        if avg.abs() < f64::from(self.settings.hw_min_counts) {
            self.op.tell(&format!("WARNING: Tare value very low ({avg:.0})"));
            self.op.tell("  This usually means load cell is not connected properly.");
            if !confirm(self.op, "  Continue anyway? (yes/no): ")? {
                return Err(CalibrationFailure::TareAborted { offset: avg });
            }
        }
        self.state.offset = avg;
        self.op.tell(&format!("Tare offset: {avg:.0}"));
        info!(offset = avg, readings = n, "tare");
        Ok(())
    }

    fn full_tare(&mut self) -> Result<(), CalibrationFailure> {
        self.enter(Phase::Tare);
        self.op.tell(&format!("\n{RULE}"));
        self.op.tell("[STEP 1] ZERO CALIBRATION (TARE)");
        self.op.tell(RULE);
        self.op.ask("Remove all weight and press Enter...")?;
        self.tare(self.settings.readings.calibration)?;

        let residual = self
            .state
            .value(self.agg.read_average(ZERO_CHECK_READINGS)?);
        self.op.tell(&format!("Verification (should be near 0): {residual:.2}"));
        if residual.abs() > self.settings.tare_unstable_counts {
            self.op.tell("WARNING: Zero point unstable. Readings may drift.");
            warn!(residual, "zero point unstable after tare");
        }
        Ok(())
    }

    fn weight_calibration(&mut self, attempt: u32) -> Result<Step, CalibrationFailure> {
        self.enter(Phase::WeightCalibration);
        let max = self.settings.max_attempts;
        if attempt > 1 {
            self.op.tell(&format!("\n--- Calibration Attempt {attempt}/{max} ---"));
        }
        self.op.tell(&format!("\n{RULE}"));
        self.op.tell("[STEP 2] WEIGHT CALIBRATION");
        self.op.tell(RULE);
        for line in [
            "You'll need a known weight (e.g., 100g, 500g, 1kg)",
            "Use a calibrated weight if possible for best accuracy",
            "\nTIPS for better calibration:",
            "  - Ensure load cell is firmly mounted",
            "  - Place weight in CENTER of platform",
            "  - Keep area vibration-free during measurement",
            "  - Use the heaviest accurate weight you have",
        ] {
            self.op.tell(line);
        }

        let answer = self.op.ask("\nEnter known weight in grams: ")?;
        let known_g = match answer.trim().parse::<f64>() {
            Ok(g) if g.is_finite() && g > 0.0 => g,
            _ => {
                self.op.tell("Invalid weight entered.");
                if attempt >= max {
                    return Err(CalibrationFailure::InvalidInput(format!(
                        "reference weight {:?}",
                        answer.trim()
                    )));
                }
                return Ok(Step::WeightCalibration {
                    attempt: attempt + 1,
                });
            }
        };

        if attempt > 1 {
            self.op.tell("\nRe-zeroing scale...");
            self.op.ask("Ensure scale is empty and press Enter...")?;
            self.tare(self.settings.readings.tare)?;
            self.pause(RETARE_PAUSE)?;
        }

        self.op.ask(&format!(
            "\nPlace EXACTLY {known_g}g weight on CENTER of scale and press Enter..."
        ))?;
        self.op.tell("Stabilizing...");
        self.pause(self.settings.stabilization)?;
        self.op.tell("Measuring (keep scale steady)...");

        let raw = self
            .state
            .value(self.agg.read_average(self.settings.readings.calibration)?);
        self.op.tell(&format!("Raw reading with weight: {raw:.2}"));

        if raw.abs() < self.settings.min_raw_reading {
            for line in [
                "\nERROR: No weight change detected!",
                "Possible problems:",
                "  - Weight too light for this load cell",
                "  - Load cell not sensing weight (check mounting)",
                "  - A+/A- wires swapped",
            ] {
                self.op.tell(line);
            }
            warn!(raw, attempt, "no weight change detected");
            if attempt < max && confirm(self.op, "\nTry again? (yes/no): ")? {
                return Ok(Step::WeightCalibration {
                    attempt: attempt + 1,
                });
            }
            return Err(CalibrationFailure::NoWeightChange { raw });
        }

        self.state.scale = CalibrationState::scale_for(raw, known_g);
        self.op.tell("\nInitial calibration done!");
        self.op.tell(&format!(
            "  Scale factor: {:.2} counts/gram",
            self.state.scale
        ));
        info!(scale = self.state.scale, known_g, attempt, "scale factor computed");
        Ok(Step::Verification { attempt, known_g })
    }

    /// Remove and re-apply the reference weight; returns the verdict and the
    /// measured error in percent.
    fn verify(&mut self, attempt: u32, known_g: f64) -> Result<(Verdict, f64), CalibrationFailure> {
        self.enter(Phase::Verification);
        let s = self.settings;
        self.op.tell("\nVerifying calibration...");
        self.op.ask("REMOVE the weight completely and press Enter...")?;
        self.pause(s.settle)?;
        let mut empty = self
            .state
            .units(self.agg.read_average(s.readings.verification)?);
        self.op.tell(&format!(
            "Empty scale reading: {empty:.2}g (should be near 0)"
        ));

        if empty.abs() > s.max_zero_drift_g {
            self.op.tell(&format!(
                "WARNING: Large zero offset detected ({empty:.2}g)"
            ));
            self.op.tell("This suggests unstable readings or load cell movement.");
            warn!(empty_g = empty, "zero drift after calibration");
            if confirm(self.op, "Re-tare the scale now? (yes/no): ")? {
                self.op.ask("Keep scale empty and press Enter...")?;
                self.tare(s.readings.tare)?;
                empty = self
                    .state
                    .units(self.agg.read_average(ZERO_CHECK_READINGS)?);
                self.op.tell(&format!("New zero reading: {empty:.2}g"));
            }
        }

        self.op.ask(&format!(
            "\nPlace the {known_g}g weight back on CENTER and press Enter..."
        ))?;
        self.pause(s.settle)?;
        let measured = self
            .state
            .units(self.agg.read_average(s.readings.measurement)?);
        let error = (measured - known_g).abs();
        let error_pct = error / known_g * 100.0;
        self.op.tell("\nVerification results:");
        self.op.tell(&format!("  Expected: {known_g:.2}g"));
        self.op.tell(&format!("  Measured: {measured:.2}g"));
        self.op.tell(&format!("  Error: {error:.2}g ({error_pct:.1}%)"));
        info!(known_g, measured, error_pct, attempt, "calibration verified");

        let verdict = self.judge(error_pct, attempt)?;
        Ok((verdict, error_pct))
    }

    fn judge(&mut self, error_pct: f64, attempt: u32) -> Result<Verdict, CalibrationFailure> {
        let s = self.settings;
        if error_pct <= s.excellent_error_pct {
            self.op.tell(&format!(
                "Excellent calibration! (Error < {}%)",
                s.excellent_error_pct
            ));
            return Ok(Verdict::Accept);
        }
        if error_pct <= s.acceptable_error_pct {
            self.op.tell(&format!(
                "Good calibration (Error < {}%)",
                s.acceptable_error_pct
            ));
            return Ok(Verdict::Accept);
        }

        self.op.tell(&format!(
            "\nWARNING: High calibration error (>{}%)!",
            s.acceptable_error_pct
        ));
        for line in [
            "Possible causes:",
            "  - Weight not centered on platform",
            "  - Load cell not securely mounted",
            "  - Movement/vibration during measurement",
            "  - Known weight inaccurate",
        ] {
            self.op.tell(line);
        }
        warn!(error_pct, attempt, "calibration out of tolerance");

        let accepted = if attempt < s.max_attempts {
            if confirm(self.op, "\nTry calibration again? (yes/no): ")? {
                return Ok(Verdict::Retry);
            }
            confirm(self.op, "Use this calibration anyway? (yes/no): ")?
        } else {
            confirm(
                self.op,
                "\nMax attempts reached. Use this calibration? (yes/no): ",
            )?
        };
        if accepted {
            warn!(error_pct, "out-of-tolerance calibration accepted by operator");
            Ok(Verdict::Accept)
        } else {
            Ok(Verdict::Reject)
        }
    }

    fn quick_verify(&mut self, factor: f64) -> Result<(), CalibrationFailure> {
        self.enter(Phase::SavedFactorQuickVerify);
        self.state.scale = factor;
        let s = self.settings;

        self.op.tell(&format!("\n{RULE}"));
        self.op.tell("[ZERO CALIBRATION (TARE)]");
        self.op.tell(RULE);
        self.op.ask("Remove all weight and press Enter...")?;
        self.tare(s.readings.calibration)?;
        let zero = self
            .state
            .value(self.agg.read_average(ZERO_CHECK_READINGS)?);
        self.op.tell(&format!("Zero point: {zero:.2} (should be near 0)"));

        if !confirm(
            self.op,
            "\nDo you want to verify with a known weight? (yes/no): ",
        )? {
            return Ok(());
        }

        let answer = self.op.ask("Enter weight in grams: ")?;
        let weight = match answer.trim().parse::<f64>() {
            Ok(g) if g.is_finite() && g > 0.0 => g,
            _ => {
                self.op.tell("Invalid weight entered.");
                return Err(CalibrationFailure::InvalidInput(format!(
                    "verification weight {:?}",
                    answer.trim()
                )));
            }
        };
        self.op.ask(&format!("Place {weight}g on scale and press Enter..."))?;
        self.pause(s.settle)?;
        let measured = self
            .state
            .units(self.agg.read_average(s.readings.verification)?);
        let error_pct = (measured - weight).abs() / weight * 100.0;
        self.op.tell(&format!(
            "Measured: {measured:.2}g (Error: {error_pct:.1}%)"
        ));
        if error_pct > s.quick_verify_max_error_pct {
            self.op.tell("WARNING: Large error! Consider recalibrating.");
            warn!(error_pct, factor, "saved scale factor out of tolerance");
            return Err(CalibrationFailure::QuickVerifyFailed { error_pct });
        }
        info!(error_pct, factor, "saved scale factor verified");
        Ok(())
    }
}
