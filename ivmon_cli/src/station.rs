//! Hardware assembly and command execution.

use std::time::Duration;

use eyre::{WrapErr, eyre};
use ivmon_config::Config;
use ivmon_core::{
    CalibrationFailure, ConsoleOperator, IndicatorController, NullSink, ReadingSink, RunReport,
    SampleAggregator, Station, StationSettings, TransmissionClient,
};
use ivmon_hardware::{Gain, Hx711, Hx711Timing};
use ivmon_traits::{CancelToken, Gpio, MonotonicClock};

use crate::cli::{Commands, JSON_MODE};
use crate::rt::setup_rt_once;

type HwStation<G> = Station<
    Hx711<<G as Gpio>::Input, <G as Gpio>::Output, MonotonicClock>,
    MonotonicClock,
    <G as Gpio>::Output,
>;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn make_sink(cfg: &Config) -> eyre::Result<Box<dyn ReadingSink + Send>> {
    match cfg.collector.url.as_deref() {
        Some(url) => {
            let client = TransmissionClient::new(url, ms(cfg.collector.timeout_ms))
                .wrap_err("build HTTP client")?;
            tracing::info!(url, "forwarding readings to collector");
            Ok(Box::new(client))
        }
        None => {
            tracing::info!("no collector configured; readings stay local");
            Ok(Box::new(NullSink))
        }
    }
}

/// Claim every pin, start the HX711 and wire up the station.
fn assemble<G: Gpio>(gpio: &G, cfg: &Config, cancel: &CancelToken) -> eyre::Result<HwStation<G>> {
    let pins = &cfg.pins;
    let input = |pin: u8| {
        gpio.input(pin)
            .map_err(|e| eyre!("open pin {pin} as input: {e}"))
    };
    let output = |pin: u8| {
        gpio.output(pin)
            .map_err(|e| eyre!("open pin {pin} as output: {e}"))
    };

    let timing = Hx711Timing {
        ready_polls: cfg.hx711.ready_polls,
        ready_poll: ms(cfg.hx711.ready_poll_ms),
        settle: ms(cfg.hx711.settle_ms),
        ..Hx711Timing::default()
    };
    let mut hx = Hx711::new(
        input(pins.hx711_dt)?,
        output(pins.hx711_sck)?,
        MonotonicClock::new(),
        Gain::from_factor(cfg.hx711.gain),
        timing,
    )
    .with_cancel(cancel.clone());
    hx.start().wrap_err("start HX711")?;
    tracing::info!(
        dt = pins.hx711_dt,
        sck = pins.hx711_sck,
        gain = cfg.hx711.gain,
        "HX711 initialized"
    );

    let settings = StationSettings::from(cfg);
    let indicators = IndicatorController::new(
        output(pins.low_light)?,
        output(pins.ok_light)?,
        output(pins.calibration_light)?,
        settings.indicators.clone(),
    );
    let agg = SampleAggregator::new(hx, MonotonicClock::new(), ms(cfg.hx711.inter_read_ms))
        .with_cancel(cancel.clone());
    Ok(Station::new(agg, indicators, make_sink(cfg)?, settings))
}

fn print_report(report: &RunReport) {
    let cal = &report.calibration;
    let mon = &report.monitor;
    if JSON_MODE.get().copied().unwrap_or(false) {
        let obj = serde_json::json!({
            "calibration": {
                "mode": format!("{:?}", cal.mode),
                "offset": cal.state.offset,
                "scale": cal.state.scale,
                "attempts": cal.attempts,
            },
            "monitor": {
                "cycles": mon.cycles,
                "skipped": mon.skipped,
                "sent": mon.sent,
                "unsent": mon.unsent,
                "transmitting": mon.transmitting,
                "interrupted": mon.interrupted,
            },
        });
        println!("{obj}");
    } else {
        let forwarded = if mon.transmitting {
            format!("{} sent, {} unsent", mon.sent, mon.unsent)
        } else {
            "no collector configured".to_string()
        };
        println!(
            "Scale factor {:.2} (offset {:.0}); {} readings, {} skipped, {forwarded}",
            cal.state.scale, cal.state.offset, mon.cycles, mon.skipped
        );
    }
}

fn execute_on<G: Gpio>(
    gpio: &G,
    cmd: &Commands,
    cfg: &Config,
    cancel: CancelToken,
) -> eyre::Result<()> {
    let mut station = assemble(gpio, cfg, &cancel)?;
    let mut op = ConsoleOperator::new(cancel);

    let result = match cmd {
        Commands::SelfCheck => self_check::<G>(&mut station, &mut op, cfg),
        Commands::Run {
            cycles,
            rt,
            rt_prio,
            rt_lock,
            ..
        } => {
            if *rt {
                setup_rt_once(*rt_prio, *rt_lock);
            }
            match station.run(&mut op, *cycles) {
                Ok(report) => {
                    print_report(&report);
                    Ok(())
                }
                Err(CalibrationFailure::Interrupted) => {
                    tracing::info!("interrupted during calibration");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
    };
    station.shutdown();
    println!("Cleanup complete");
    result
}

fn self_check<G: Gpio>(
    station: &mut HwStation<G>,
    op: &mut ConsoleOperator,
    cfg: &Config,
) -> eyre::Result<()> {
    let raw = station.self_check(op)?;
    println!("HX711 OK (raw {raw})");
    if let Some(url) = cfg.collector.url.as_deref() {
        let client = TransmissionClient::new(url, ms(cfg.collector.timeout_ms))
            .wrap_err("build HTTP client")?;
        if client.test_connection() {
            println!("Collector OK ({url})");
        } else {
            println!("Collector unreachable ({url})");
            tracing::warn!(url, "collector did not answer 200");
        }
    }
    Ok(())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn execute(cmd: &Commands, cfg: &Config, cancel: CancelToken) -> eyre::Result<()> {
    let gpio = ivmon_hardware::RpiGpio::open().wrap_err("open GPIO")?;
    execute_on(&gpio, cmd, cfg, cancel)
}

/// Simulated HX711; `IVMON_SIM_LOAD_G` sets the load and
/// `IVMON_SIM_DISCONNECTED=1` silences the chip.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn execute(cmd: &Commands, cfg: &Config, cancel: CancelToken) -> eyre::Result<()> {
    use ivmon_hardware::{SimGpio, SimLoadCellParams};
    const SIM_LOAD_ENV: &str = "IVMON_SIM_LOAD_G";
    const SIM_DISCONNECTED_ENV: &str = "IVMON_SIM_DISCONNECTED";

    let gpio = SimGpio::new(
        cfg.pins.hx711_dt,
        cfg.pins.hx711_sck,
        SimLoadCellParams::default(),
    );
    let sim = gpio.handle();
    if let Ok(v) = std::env::var(SIM_LOAD_ENV) {
        let grams: f64 = v
            .trim()
            .parse()
            .map_err(|e| eyre!("{SIM_LOAD_ENV}={v:?}: {e}"))?;
        sim.set_load_g(grams);
    }
    if std::env::var(SIM_DISCONNECTED_ENV).is_ok_and(|v| v == "1") {
        sim.set_disconnected(true);
    }
    tracing::warn!("running against the simulated HX711");
    execute_on(&gpio, cmd, cfg, cancel)
}
