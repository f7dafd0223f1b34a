use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("hx711 data-ready timeout")]
    DataReadyTimeout,
    #[error("interrupted while waiting for hx711")]
    Interrupted,
}

impl HwError {
    /// Lift a trait-boundary GPIO error into `HwError::Gpio`.
    pub(crate) fn gpio(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        HwError::Gpio(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
