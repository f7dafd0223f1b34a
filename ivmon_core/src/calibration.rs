/// Linear raw-count model: `grams = (raw - offset) / scale`.
///
/// Starts at `{ offset: 0, scale: 1 }` and is only written by the
/// calibration engine; the monitor receives it by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    /// Raw counts at zero load.
    pub offset: f64,
    /// Counts per gram.
    pub scale: f64,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }
}

impl CalibrationState {
    /// Offset-corrected counts.
    #[inline]
    pub fn value(&self, raw_avg: f64) -> f64 {
        raw_avg - self.offset
    }

    /// Grams for an averaged raw reading; a zero scale yields 0.
    #[inline]
    pub fn units(&self, raw_avg: f64) -> f64 {
        if self.scale == 0.0 {
            return 0.0;
        }
        self.value(raw_avg) / self.scale
    }

    /// Counts per gram from an offset-corrected reading of a known weight.
    #[inline]
    pub fn scale_for(raw_delta: f64, known_g: f64) -> f64 {
        raw_delta / known_g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_from_reference_weight() {
        let scale = CalibrationState::scale_for(4000.0, 400.0);
        assert_eq!(scale, 10.0);
        let cal = CalibrationState { offset: 0.0, scale };
        assert_eq!(cal.units(4500.0), 450.0);
    }

    #[test]
    fn offset_is_subtracted_first() {
        let cal = CalibrationState {
            offset: 84_000.0,
            scale: 420.0,
        };
        assert_eq!(cal.value(84_420.0), 420.0);
        assert_eq!(cal.units(84_420.0), 1.0);
    }

    #[test]
    fn zero_scale_short_circuits() {
        let cal = CalibrationState {
            offset: 10.0,
            scale: 0.0,
        };
        assert_eq!(cal.units(1e6), 0.0);
    }

    #[test]
    fn default_is_identity() {
        let cal = CalibrationState::default();
        assert_eq!(cal.units(123.0), 123.0);
    }
}
