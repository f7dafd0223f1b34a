use thiserror::Error;

/// Failure to produce a reading from the ADC.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcquireError {
    /// The bad-read budget of one average was exhausted.
    #[error("too many failed reads ({bad_reads} bad, {requested} requested); check connections")]
    SensorUnusable { bad_reads: usize, requested: usize },
    #[error("HX711 not ready; check wiring")]
    NotReady,
    #[error("interrupted")]
    Interrupted,
    #[error("hardware error: {0}")]
    Hardware(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WiringFault {
    #[error("HX711 never signalled data ready")]
    NotReady,
    #[error("raw value {raw} too low; load cell not connected or wired incorrectly")]
    NoSignal { raw: i32 },
    #[error("too many failed reads ({bad_reads} bad, {requested} requested)")]
    TooManyBadReads { bad_reads: usize, requested: usize },
}

/// Why calibration did not produce a usable scale.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationFailure {
    #[error("wiring fault: {0}")]
    WiringFault(#[from] WiringFault),
    #[error("no weight change detected (raw {raw:.2})")]
    NoWeightChange { raw: f64 },
    #[error("calibration rejected by operator (error {error_pct:.1}%)")]
    Rejected { error_pct: f64 },
    #[error("saved scale factor failed verification (error {error_pct:.1}%)")]
    QuickVerifyFailed { error_pct: f64 },
    #[error("tare aborted: baseline {offset:.0} looks disconnected")]
    TareAborted { offset: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("interrupted")]
    Interrupted,
    #[error("operator input closed")]
    InputClosed,
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl From<AcquireError> for CalibrationFailure {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::SensorUnusable {
                bad_reads,
                requested,
            } => WiringFault::TooManyBadReads {
                bad_reads,
                requested,
            }
            .into(),
            AcquireError::NotReady => WiringFault::NotReady.into(),
            AcquireError::Interrupted => CalibrationFailure::Interrupted,
            AcquireError::Hardware(s) => CalibrationFailure::Hardware(s),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PromptError {
    #[error("operator input closed")]
    Closed,
    #[error("interrupted while waiting for operator")]
    Interrupted,
}

impl From<PromptError> for CalibrationFailure {
    fn from(e: PromptError) -> Self {
        match e {
            PromptError::Closed => CalibrationFailure::InputClosed,
            PromptError::Interrupted => CalibrationFailure::Interrupted,
        }
    }
}
