use ivmon_core::{AlertState, CalibrationState, MovingAverage, WeightStatus, wire_weight};
use proptest::prelude::*;

proptest! {
    #[test]
    fn window_never_exceeds_capacity(
        cap in 1usize..12,
        values in proptest::collection::vec(-5_000.0f64..5_000.0, 0..60),
    ) {
        let mut ma = MovingAverage::new(cap);
        for v in &values {
            ma.push(*v);
            prop_assert!(ma.len() <= cap);
        }
        prop_assert_eq!(ma.len(), values.len().min(cap));
    }

    #[test]
    fn window_mean_is_mean_of_newest(
        cap in 1usize..12,
        values in proptest::collection::vec(-5_000.0f64..5_000.0, 1..60),
    ) {
        let mut ma = MovingAverage::new(cap);
        let mut last = 0.0;
        for v in &values {
            last = ma.push(*v);
        }
        let tail = &values[values.len().saturating_sub(cap)..];
        let expect = tail.iter().sum::<f64>() / tail.len() as f64;
        prop_assert!((last - expect).abs() < 1e-6);
        prop_assert_eq!(ma.values().collect::<Vec<_>>(), tail.to_vec());
    }

    #[test]
    fn wire_weight_is_nearest_non_negative_gram(g in -10_000.0f64..10_000.0) {
        let w = wire_weight(g);
        if g <= 0.0 {
            prop_assert_eq!(w, 0);
        } else {
            prop_assert!((w as f64 - g).abs() <= 0.5);
        }
    }

    #[test]
    fn calibrated_units_recover_the_load(
        offset in -8_000_000.0f64..8_000_000.0,
        scale in prop_oneof![-2_000.0f64..-0.5, 0.5f64..2_000.0],
        grams in 0.0f64..5_000.0,
    ) {
        let cal = CalibrationState { offset, scale };
        let raw = offset + grams * scale;
        prop_assert!((cal.units(raw) - grams).abs() < 1e-3);
    }

    #[test]
    fn alert_splits_at_the_limit(g in -500.0f64..2_000.0, limit in 0.0f64..500.0) {
        let alert = AlertState::for_weight(g, limit);
        prop_assert_eq!(alert == AlertState::Low, g <= limit);
    }

    #[test]
    fn stable_band_is_empty(g in -100.0f64..100.0, band in 0.1f64..50.0) {
        let status = WeightStatus::classify(g, band);
        prop_assert_eq!(status == WeightStatus::Empty, g.abs() < band);
        if status == WeightStatus::Negative {
            prop_assert!(g < 0.0);
        }
    }
}
