use std::time::Duration;

use ivmon_hardware::hx711::{RAW_MAX, RAW_MIN};
use ivmon_hardware::{Gain, HwError, Hx711, Hx711Timing, SimGpio, SimHandle, SimLoadCellParams};
use ivmon_traits::clock::test_clock::TestClock;
use ivmon_traits::{Adc, CancelToken, Gpio};
use proptest::prelude::*;
use rstest::rstest;

const DT: u8 = 5;
const SCK: u8 = 6;

type SimHx711 = Hx711<
    <SimGpio as Gpio>::Input,
    <SimGpio as Gpio>::Output,
    TestClock,
>;

fn quiet() -> SimLoadCellParams {
    SimLoadCellParams {
        zero_counts: 84_000,
        counts_per_gram: 420.0,
        noise_counts: 0,
    }
}

fn driver(gain: Gain) -> (SimHx711, SimHandle, TestClock) {
    let clock = TestClock::new();
    let gpio = SimGpio::new(DT, SCK, quiet()).with_clock(clock.clone());
    let handle = gpio.handle();
    let hx = Hx711::new(
        gpio.input(DT).expect("dt"),
        gpio.output(SCK).expect("sck"),
        clock.clone(),
        gain,
        Hx711Timing::default(),
    );
    (hx, handle, clock)
}

#[test]
fn start_power_cycles_and_settles() {
    let (mut hx, sim, clock) = driver(Gain::A128);
    hx.start().expect("start");
    assert_eq!(sim.power_cycles(), 1);
    assert!(!sim.sck_is_high(), "clock must idle low");
    // two power holds plus settle
    assert!(clock.elapsed() >= Duration::from_millis(520));
}

#[test]
fn reads_scripted_values_in_order() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    sim.push_raw([1234, -5, 0]);
    assert_eq!(hx.read_raw().unwrap(), 1234);
    assert_eq!(hx.read_raw().unwrap(), -5);
    assert_eq!(hx.read_raw().unwrap(), 0);
}

#[test]
fn reads_follow_the_load() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    assert_eq!(hx.read_raw().unwrap(), 84_000);
    sim.set_load_g(100.0);
    assert_eq!(hx.read_raw().unwrap(), 84_000 + 42_000);
}

#[rstest]
#[case(Gain::A128, 1)]
#[case(Gain::B32, 2)]
#[case(Gain::A64, 3)]
fn emits_gain_pulses_after_each_word(#[case] gain: Gain, #[case] pulses: u32) {
    let (mut hx, sim, _clock) = driver(gain);
    hx.start().expect("start");
    hx.read_raw().unwrap();
    hx.read_raw().unwrap();
    assert_eq!(sim.last_gain_pulses(), Some(pulses));
}

#[test]
fn set_gain_applies_from_next_cycle() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    hx.set_gain(Gain::A64).expect("set gain");
    assert_eq!(hx.gain(), Gain::A64);
    hx.read_raw().unwrap();
    assert_eq!(sim.last_gain_pulses(), Some(3));
}

#[test]
fn disconnected_chip_times_out() {
    let (mut hx, sim, clock) = driver(Gain::A128);
    hx.start().expect("start");
    sim.set_disconnected(true);
    let before = clock.elapsed();
    let err = hx.read_raw().expect_err("must time out");
    assert!(matches!(err, HwError::DataReadyTimeout));
    assert_eq!(clock.elapsed() - before, Duration::from_secs(1));
}

#[test]
fn start_tolerates_missing_chip() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    sim.set_disconnected(true);
    hx.start().expect("start never fails on a silent chip");
    assert!(matches!(hx.read_raw(), Err(HwError::DataReadyTimeout)));
}

#[test]
fn cancel_interrupts_ready_wait() {
    let (hx, sim, _clock) = driver(Gain::A128);
    let token = CancelToken::new();
    let mut hx = hx.with_cancel(token.clone());
    hx.start().expect("start");
    sim.set_disconnected(true);
    token.cancel();
    assert!(matches!(hx.read_raw(), Err(HwError::Interrupted)));
}

#[test]
fn power_down_leaves_clock_high() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    Adc::power_down(&mut hx).expect("power down");
    assert!(sim.sck_is_high());
}

#[test]
fn power_down_after_a_read_is_seen_by_the_chip() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    sim.push_raw([777, 888]);
    assert_eq!(hx.read_raw().unwrap(), 777);

    hx.power_down().expect("power down");
    assert_eq!(sim.power_cycles(), 2);

    hx.power_up().expect("power up");
    assert_eq!(sim.power_cycles(), 2);
    assert_eq!(sim.last_gain_pulses(), Some(1), "held pulse is not a gain pulse");
    assert_eq!(hx.read_raw().unwrap(), 888);
}

#[test]
fn short_gain_pulses_are_not_power_downs() {
    let (mut hx, sim, _clock) = driver(Gain::A64);
    hx.start().expect("start");
    hx.read_raw().expect("read");
    hx.read_raw().expect("read");
    assert_eq!(sim.power_cycles(), 1);
    assert_eq!(sim.last_gain_pulses(), Some(3));
}

#[test]
fn adc_trait_reports_timeout_as_error() {
    let (mut hx, sim, _clock) = driver(Gain::A128);
    hx.start().expect("start");
    sim.set_disconnected(true);
    let err = Adc::read_raw(&mut hx).expect_err("timeout");
    assert!(err.to_string().contains("timeout"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn any_24_bit_value_survives_the_wire(v in RAW_MIN..=RAW_MAX) {
        let (mut hx, sim, _clock) = driver(Gain::A128);
        hx.start().unwrap();
        sim.push_raw([v]);
        prop_assert_eq!(hx.read_raw().unwrap(), v);
    }
}
