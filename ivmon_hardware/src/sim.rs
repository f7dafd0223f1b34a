//! Simulated GPIO with an HX711 + load cell behind the DT/SCK pins.
//!
//! The model follows the wire protocol closely enough to exercise the real
//! driver: DOUT low means "conversion ready", every SCK rising edge shifts
//! out the next bit MSB first, pulses 25..=27 select the next gain. SCK
//! raised without a prior ready observation, or held high for at least
//! 60 us of sim clock time, is a power-down/up cycle. Every other output pin
//! records its level history.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ivmon_traits::{Clock, Gpio, InputLine, Level, OutputLine};

use crate::hx711::{RAW_MAX, RAW_MIN};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedClock = Arc<dyn Clock + Send + Sync>;

/// SCK high time after which the chip powers down.
const POWER_DOWN_HOLD: Duration = Duration::from_micros(60);

/// Electrical characteristics of the simulated load cell.
#[derive(Debug, Clone)]
pub struct SimLoadCellParams {
    /// Raw counts with nothing on the platform.
    pub zero_counts: i32,
    /// Raw counts per gram of load.
    pub counts_per_gram: f64,
    /// Peak amplitude of uniform noise added to each conversion.
    pub noise_counts: i32,
}

impl Default for SimLoadCellParams {
    fn default() -> Self {
        Self {
            zero_counts: 84_000,
            counts_per_gram: 420.0,
            noise_counts: 40,
        }
    }
}

struct Model {
    params: SimLoadCellParams,
    load_g: f64,
    disconnected: bool,
    scripted: VecDeque<i32>,
    rng: u64,
    // protocol state
    sck_high: bool,
    armed: bool,
    pulses: u32,
    word: u32,
    power_pulse: bool,
    last_gain_pulses: Option<u32>,
    power_cycles: u32,
    clock: Option<SharedClock>,
    rose_at: Option<Instant>,
}

impl Model {
    fn new(params: SimLoadCellParams) -> Self {
        let mut m = Self {
            params,
            load_g: 0.0,
            disconnected: false,
            scripted: VecDeque::new(),
            rng: 0x9E37_79B9_7F4A_7C15,
            sck_high: false,
            armed: false,
            pulses: 0,
            word: 0,
            power_pulse: false,
            last_gain_pulses: None,
            power_cycles: 0,
            clock: None,
            rose_at: None,
        };
        m.word = m.next_word();
        m
    }

    fn noise(&mut self) -> i32 {
        let amp = self.params.noise_counts;
        if amp <= 0 {
            return 0;
        }
        // xorshift64
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        let span = (2 * amp + 1) as u64;
        (x % span) as i32 - amp
    }

    fn next_word(&mut self) -> u32 {
        let value = match self.scripted.pop_front() {
            Some(v) => v,
            None => {
                let load = (self.load_g * self.params.counts_per_gram).round() as i64;
                let v = i64::from(self.params.zero_counts) + load + i64::from(self.noise());
                v.clamp(i64::from(RAW_MIN), i64::from(RAW_MAX)) as i32
            }
        };
        (value as u32) & 0xFF_FFFF
    }

    /// Complete the previous conversion cycle, if any, and load a new word.
    fn finish_cycle(&mut self) {
        if self.pulses >= 25 {
            self.last_gain_pulses = Some(self.pulses - 24);
        }
        self.pulses = 0;
        self.armed = false;
        self.word = self.next_word();
    }

    fn dout(&mut self) -> Level {
        if self.disconnected {
            return Level::High;
        }
        if !self.sck_high && self.pulses >= 25 {
            self.finish_cycle();
        }
        match self.pulses {
            0 => {
                if !self.sck_high {
                    self.armed = true;
                }
                Level::Low
            }
            1..=24 => {
                let shift = 24 - self.pulses;
                Level::from((self.word >> shift) & 1 == 1)
            }
            _ => Level::High,
        }
    }

    fn held_for_power_down(&self) -> bool {
        match (&self.clock, self.rose_at) {
            (Some(clock), Some(at)) => {
                clock.now().saturating_duration_since(at) >= POWER_DOWN_HOLD
            }
            _ => false,
        }
    }

    fn sck(&mut self, level: Level) {
        let rising = level.is_high() && !self.sck_high;
        let falling = level.is_low() && self.sck_high;
        self.sck_high = level.is_high();
        if rising {
            self.rose_at = self.clock.as_ref().map(|c| c.now());
            if self.armed || self.pulses > 0 {
                self.pulses += 1;
            } else {
                self.power_pulse = true;
            }
        } else if falling {
            if self.power_pulse {
                self.power_pulse = false;
            } else if self.held_for_power_down() {
                // The long pulse was taken for a data or gain pulse.
                self.pulses = self.pulses.saturating_sub(1);
            } else {
                return;
            }
            self.finish_cycle();
            self.power_cycles += 1;
        }
    }
}

type Histories = Arc<Mutex<HashMap<u8, Vec<Level>>>>;

/// Test/CLI handle onto the simulated hardware.
#[derive(Clone)]
pub struct SimHandle {
    model: Arc<Mutex<Model>>,
    outputs: Histories,
}

impl SimHandle {
    fn with_model<R>(&self, f: impl FnOnce(&mut Model) -> R) -> Option<R> {
        self.model.lock().ok().map(|mut m| f(&mut m))
    }

    pub fn set_load_g(&self, grams: f64) {
        self.with_model(|m| m.load_g = grams);
    }

    /// A disconnected chip never pulls DOUT low.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.with_model(|m| m.disconnected = disconnected);
    }

    /// Queue exact raw values for the next conversions, ahead of the model.
    pub fn push_raw(&self, values: impl IntoIterator<Item = i32>) {
        self.with_model(|m| m.scripted.extend(values));
    }

    /// Extra pulses observed after the most recent completed conversion.
    pub fn last_gain_pulses(&self) -> Option<u32> {
        self.with_model(|m| m.last_gain_pulses).flatten()
    }

    /// Power-downs entered, counting one still held.
    pub fn power_cycles(&self) -> u32 {
        self.with_model(|m| {
            let held = m.sck_high && (m.power_pulse || m.held_for_power_down());
            m.power_cycles + u32::from(held)
        })
        .unwrap_or(0)
    }

    pub fn sck_is_high(&self) -> bool {
        self.with_model(|m| m.sck_high).unwrap_or(false)
    }

    /// Last level written to an output pin, if it was ever written.
    pub fn output_level(&self, pin: u8) -> Option<Level> {
        self.output_history(pin).last().copied()
    }

    pub fn output_history(&self, pin: u8) -> Vec<Level> {
        self.outputs
            .lock()
            .ok()
            .and_then(|h| h.get(&pin).cloned())
            .unwrap_or_default()
    }
}

pub struct SimGpio {
    dt_pin: u8,
    sck_pin: u8,
    handle: SimHandle,
}

impl SimGpio {
    pub fn new(dt_pin: u8, sck_pin: u8, params: SimLoadCellParams) -> Self {
        Self {
            dt_pin,
            sck_pin,
            handle: SimHandle {
                model: Arc::new(Mutex::new(Model::new(params))),
                outputs: Arc::new(Mutex::new(HashMap::new())),
            },
        }
    }

    /// Time SCK pulses with `clock` (share the driver's clock), so a long
    /// SCK high after a completed conversion registers as a power-down.
    #[must_use]
    pub fn with_clock(self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.handle.with_model(|m| m.clock = Some(Arc::new(clock)));
        self
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }
}

/// DOUT of the simulated chip, or a floating input on any other pin.
pub struct SimInput {
    model: Option<Arc<Mutex<Model>>>,
}

impl InputLine for SimInput {
    fn read(&mut self) -> Result<Level, BoxError> {
        match &self.model {
            Some(model) => {
                let mut m = model.lock().map_err(|_| "sim model poisoned")?;
                Ok(m.dout())
            }
            None => Ok(Level::Low),
        }
    }
}

enum OutputKind {
    Sck(Arc<Mutex<Model>>),
    Recorded { pin: u8, outputs: Histories },
}

pub struct SimOutput {
    kind: OutputKind,
}

impl OutputLine for SimOutput {
    fn write(&mut self, level: Level) -> Result<(), BoxError> {
        match &self.kind {
            OutputKind::Sck(model) => {
                let mut m = model.lock().map_err(|_| "sim model poisoned")?;
                m.sck(level);
            }
            OutputKind::Recorded { pin, outputs } => {
                let mut h = outputs.lock().map_err(|_| "sim outputs poisoned")?;
                h.entry(*pin).or_default().push(level);
            }
        }
        Ok(())
    }
}

impl Gpio for SimGpio {
    type Input = SimInput;
    type Output = SimOutput;

    fn input(&self, pin: u8) -> Result<SimInput, BoxError> {
        let model = (pin == self.dt_pin).then(|| self.handle.model.clone());
        Ok(SimInput { model })
    }

    fn output(&self, pin: u8) -> Result<SimOutput, BoxError> {
        let kind = if pin == self.sck_pin {
            OutputKind::Sck(self.handle.model.clone())
        } else {
            OutputKind::Recorded {
                pin,
                outputs: self.handle.outputs.clone(),
            }
        };
        Ok(SimOutput { kind })
    }
}
