//! Maps `Box<dyn Error>` from trait boundaries to typed `AcquireError`.
//!
//! The traits in `ivmon_traits` use `Box<dyn Error + Send + Sync>` so any
//! GPIO backend can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `ivmon_hardware::HwError`.

use crate::error::AcquireError;

/// Map a trait-boundary error to a typed `AcquireError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> AcquireError {
    #[cfg(feature = "hardware-errors")]
    {
        use ivmon_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::DataReadyTimeout => AcquireError::NotReady,
                HwError::Interrupted => AcquireError::Interrupted,
                other => AcquireError::Hardware(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("not ready") {
        AcquireError::NotReady
    } else if lower.contains("interrupted") {
        AcquireError::Interrupted
    } else {
        AcquireError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hw_errors() {
        use ivmon_hardware::error::HwError;
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::DataReadyTimeout);
        assert_eq!(map_hw_error(&*e), AcquireError::NotReady);
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::Gpio("bus".into()));
        assert!(matches!(map_hw_error(&*e), AcquireError::Hardware(s) if s.contains("bus")));
    }

    #[test]
    fn falls_back_to_message() {
        let e = std::io::Error::other("read timeout");
        assert_eq!(map_hw_error(&e), AcquireError::NotReady);
        let e = std::io::Error::other("pin busy");
        assert_eq!(map_hw_error(&e), AcquireError::Hardware("pin busy".into()));
    }
}
