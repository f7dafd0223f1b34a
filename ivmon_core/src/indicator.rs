//! Status lights.
//!
//! The low and ok lines are only ever written from the owning thread. The
//! calibration line is moved into the blink thread while blinking and handed
//! back on join, so no line is shared and no lock is needed.
use std::thread::JoinHandle;

use crossbeam_channel as xch;
use ivmon_traits::{Level, OutputLine};
use tracing::{debug, info, warn};

use crate::config::IndicatorSettings;
use crate::status::AlertState;

struct Blink<O> {
    stop: xch::Sender<()>,
    handle: JoinHandle<O>,
}

pub struct IndicatorController<O: OutputLine + Send + 'static> {
    low: O,
    ok: O,
    /// `None` while the blink thread owns it.
    calibration: Option<O>,
    blink: Option<Blink<O>>,
    settings: IndicatorSettings,
    last_alert: Option<AlertState>,
}

fn write_line<O: OutputLine>(line: &mut O, level: Level, name: &str) {
    if let Err(e) = line.write(level) {
        warn!(line = name, error = %e, "indicator write failed");
    }
}

impl<O: OutputLine + Send + 'static> IndicatorController<O> {
    pub fn new(low: O, ok: O, calibration: O, settings: IndicatorSettings) -> Self {
        Self {
            low,
            ok,
            calibration: Some(calibration),
            blink: None,
            settings,
            last_alert: None,
        }
    }

    /// Light exactly one of low/ok for `weight_g`. Logs only on transitions.
    pub fn control_lights(&mut self, weight_g: f64) -> AlertState {
        let alert = AlertState::for_weight(weight_g, self.settings.low_limit_g);
        let (low, ok) = match alert {
            AlertState::Low => (Level::High, Level::Low),
            AlertState::Ok => (Level::Low, Level::High),
        };
        // Clear before set so the two are never lit together.
        if low == Level::Low {
            write_line(&mut self.low, low, "low");
            write_line(&mut self.ok, ok, "ok");
        } else {
            write_line(&mut self.ok, ok, "ok");
            write_line(&mut self.low, low, "low");
        }

        if self.last_alert != Some(alert) {
            match alert {
                AlertState::Low => warn!(weight_g, "Low weight alert!"),
                AlertState::Ok => info!(weight_g, "Weight OK"),
            }
            self.last_alert = Some(alert);
        }
        alert
    }

    /// Steady on/off for the calibration light. Ignored while blinking.
    pub fn calibration_light(&mut self, on: bool) {
        match self.calibration.as_mut() {
            Some(line) => write_line(line, Level::from(on), "calibration"),
            None => debug!("calibration light is blinking; steady request ignored"),
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    /// Start toggling the calibration light every half period. No-op if
    /// already blinking.
    pub fn start_calibration_blink(&mut self) {
        if self.blink.is_some() {
            return;
        }
        let Some(mut line) = self.calibration.take() else {
            return;
        };
        let half = self.settings.blink_half_period;
        let (stop, stop_rx) = xch::bounded::<()>(1);
        let handle = std::thread::spawn(move || {
            let mut on = false;
            loop {
                on = !on;
                write_line(&mut line, Level::from(on), "calibration");
                match stop_rx.recv_timeout(half) {
                    Err(xch::RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            // Last action: leave the line de-asserted.
            write_line(&mut line, Level::Low, "calibration");
            line
        });
        debug!(half_period_ms = half.as_millis() as u64, "calibration blink started");
        self.blink = Some(Blink { stop, handle });
    }

    /// Stop blinking and wait for the thread, which leaves the light off.
    /// Safe to call when not blinking.
    pub fn stop_calibration_blink(&mut self) {
        if let Some(Blink { stop, handle }) = self.blink.take() {
            let _ = stop.send(());
            match handle.join() {
                Ok(line) => self.calibration = Some(line),
                Err(_) => warn!("calibration blink thread panicked; light state unknown"),
            }
            debug!("calibration blink stopped");
        }
        self.calibration_light(false);
    }

    /// Every indicator de-asserted.
    pub fn all_off(&mut self) {
        self.stop_calibration_blink();
        write_line(&mut self.low, Level::Low, "low");
        write_line(&mut self.ok, Level::Low, "ok");
        self.last_alert = None;
    }
}

impl<O: OutputLine + Send + 'static> Drop for IndicatorController<O> {
    fn drop(&mut self) {
        self.stop_calibration_blink();
    }
}
