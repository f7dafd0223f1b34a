//! Per-cycle classifications. Derived every cycle, never stored.
use std::fmt;

/// What the smoothed weight says about the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightStatus {
    /// Within `min_stable_weight_g` of zero.
    Empty,
    /// Below zero by more than the stable band; usually a tare or wiring fault.
    Negative,
    Normal,
}

impl WeightStatus {
    pub fn classify(smoothed_g: f64, min_stable_weight_g: f64) -> Self {
        if smoothed_g.abs() < min_stable_weight_g {
            WeightStatus::Empty
        } else if smoothed_g < 0.0 {
            WeightStatus::Negative
        } else {
            WeightStatus::Normal
        }
    }
}

impl fmt::Display for WeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeightStatus::Empty => "[EMPTY]",
            WeightStatus::Negative => "[NEGATIVE!]",
            WeightStatus::Normal => "",
        })
    }
}

/// Low-weight alert, inclusive of the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Low,
    Ok,
}

impl AlertState {
    pub fn for_weight(weight_g: f64, low_limit_g: f64) -> Self {
        if weight_g <= low_limit_g {
            AlertState::Low
        } else {
            AlertState::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, WeightStatus::Empty)]
    #[case(-4.9, WeightStatus::Empty)]
    #[case(-5.0, WeightStatus::Negative)]
    #[case(5.0, WeightStatus::Normal)]
    #[case(480.0, WeightStatus::Normal)]
    fn classifies_against_stable_band(#[case] g: f64, #[case] want: WeightStatus) {
        assert_eq!(WeightStatus::classify(g, 5.0), want);
    }

    #[rstest]
    #[case(49.0, AlertState::Low)]
    #[case(50.0, AlertState::Low)]
    #[case(51.0, AlertState::Ok)]
    fn low_limit_is_inclusive(#[case] g: f64, #[case] want: AlertState) {
        assert_eq!(AlertState::for_weight(g, 50.0), want);
    }
}
