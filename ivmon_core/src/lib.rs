#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Load-cell acquisition, calibration and monitoring (hardware-agnostic).
//!
//! All hardware access goes through `ivmon_traits::Adc` for the converter
//! and `ivmon_traits::OutputLine` for the status lights.
//!
//! ## Architecture
//!
//! - **Acquisition**: bounded-retry, outlier-trimmed averaging (`sampler`)
//! - **Calibration**: offset/scale model (`calibration`) and the
//!   operator-guided state machine that produces it (`calibrator`)
//! - **Monitoring**: per-cycle conversion, moving-average smoothing and
//!   classification (`monitor`, `smoothing`, `status`)
//! - **Indicators**: low/ok lights and the calibration blink (`indicator`)
//! - **Transmission**: forwarding readings to a collector (`transmit`)
//! - **Orchestration**: run sequencing and guaranteed teardown (`station`)

pub mod calibration;
pub mod calibrator;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod indicator;
pub mod mocks;
pub mod monitor;
pub mod operator;
pub mod sampler;
pub mod smoothing;
pub mod station;
pub mod status;
pub mod transmit;

pub use calibration::CalibrationState;
pub use calibrator::{CalibrationEngine, CalibrationMode, CalibrationOutcome, Phase, Verdict};
pub use config::{
    CalibrationSettings, IndicatorSettings, MonitorSettings, ReadingCounts, StationSettings,
};
pub use error::{AcquireError, CalibrationFailure, PromptError, WiringFault};
pub use indicator::IndicatorController;
pub use monitor::{CycleReport, Monitor, MonitorSummary};
pub use operator::{ConsoleOperator, Operator, ScriptedOperator, confirm};
pub use sampler::{SampleAggregator, trimmed_mean};
pub use smoothing::MovingAverage;
pub use station::{RunReport, Station};
pub use status::{AlertState, WeightStatus};
pub use transmit::{NullSink, ReadingSink, TransmissionClient, wire_weight};
