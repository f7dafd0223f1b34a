use std::time::Duration;

use ivmon_core::mocks::{Read, ScriptedAdc};
use ivmon_core::{AcquireError, SampleAggregator};
use ivmon_traits::CancelToken;
use ivmon_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn agg(adc: ScriptedAdc) -> SampleAggregator<ScriptedAdc, TestClock> {
    SampleAggregator::new(adc, TestClock::new(), Duration::from_millis(10))
}

#[rstest]
#[case(1, 1)]
#[case(3, 2)]
#[case(10, 6)]
#[case(20, 11)]
fn all_zero_reads_give_up_after_half_the_budget(#[case] n: usize, #[case] bad: usize) {
    let adc = ScriptedAdc::constant(0);
    let probe = adc.probe();
    let mut agg = agg(adc);
    assert_eq!(
        agg.read_average(n),
        Err(AcquireError::SensorUnusable {
            bad_reads: bad,
            requested: n,
        })
    );
    assert_eq!(probe.reads(), bad);
}

#[test]
fn timeouts_count_against_the_same_budget() {
    let adc = ScriptedAdc::new([], Read::NotReady);
    let mut agg = agg(adc);
    assert!(matches!(
        agg.read_average(5),
        Err(AcquireError::SensorUnusable { bad_reads: 3, requested: 5 })
    ));
}

#[test]
fn scattered_bad_reads_are_skipped() {
    let adc = ScriptedAdc::new(
        [
            Read::Value(10),
            Read::Value(0),
            Read::Value(20),
            Read::NotReady,
            Read::Value(30),
            Read::Value(40),
            Read::Value(50),
        ],
        Read::Value(9_999),
    );
    let probe = adc.probe();
    let mut agg = agg(adc);
    // 10..=50 trimmed of one each side.
    assert_eq!(agg.read_average(5), Ok(30.0));
    assert_eq!(probe.reads(), 7);
}

#[test]
fn outlier_is_trimmed() {
    let mut agg = agg(ScriptedAdc::values([1, 2, 3, 4, 100], 0));
    assert_eq!(agg.read_average(5), Ok(3.0));
}

#[test]
fn zero_count_still_reads_once() {
    let adc = ScriptedAdc::constant(77);
    let probe = adc.probe();
    let mut agg = agg(adc);
    assert_eq!(agg.read_average(0), Ok(77.0));
    assert_eq!(probe.reads(), 1);
}

#[test]
fn pauses_between_good_reads_only() {
    let mut agg = agg(ScriptedAdc::constant(500));
    agg.read_average(4).expect("average");
    assert_eq!(agg.clock().elapsed(), Duration::from_millis(30));

    let mut agg = self::agg(ScriptedAdc::values([0, 500, 500], 500));
    agg.read_average(2).expect("average");
    assert_eq!(agg.clock().elapsed(), Duration::from_millis(10));
}

#[test]
fn hardware_faults_propagate_immediately() {
    let adc = ScriptedAdc::new(
        [Read::Value(5), Read::Fault("spi bus gone".into())],
        Read::Value(5),
    );
    let probe = adc.probe();
    let mut agg = agg(adc);
    assert!(matches!(
        agg.read_average(5),
        Err(AcquireError::Hardware(msg)) if msg.contains("spi bus gone")
    ));
    assert_eq!(probe.reads(), 2);
}

#[test]
fn cancelled_token_stops_reads() {
    let cancel = CancelToken::new();
    let adc = ScriptedAdc::constant(500);
    let probe = adc.probe();
    let mut agg = agg(adc).with_cancel(cancel.clone());
    cancel.cancel();
    assert_eq!(agg.read_once(), Err(AcquireError::Interrupted));
    assert_eq!(agg.read_average(3), Err(AcquireError::Interrupted));
    assert_eq!(probe.reads(), 0);
    assert!(!agg.pause(Duration::from_secs(1)));
}

#[test]
fn power_down_reaches_the_adc() {
    let adc = ScriptedAdc::constant(1);
    let probe = adc.probe();
    let mut agg = agg(adc);
    agg.power_down().expect("power down");
    assert_eq!(probe.power_downs(), 1);
}
