//! Bit-serial driver for the HX711 24-bit load-cell ADC.
//!
//! One conversion is read as exactly 24 SCK pulses (MSB first), followed by
//! 1..=3 extra pulses that select gain/channel for the *next* conversion.
//! Each pulse is strictly clock-high, sample DOUT, clock-low.

use std::time::Duration;

use ivmon_traits::{Adc, CancelToken, Clock, InputLine, Level, OutputLine};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};
use crate::util::wait_until_low;

/// Largest positive 24-bit two's-complement value.
pub const RAW_MAX: i32 = 0x7F_FFFF;
/// Most negative 24-bit two's-complement value.
pub const RAW_MIN: i32 = -0x80_0000;

const SIGN_BIT: u32 = 0x80_0000;
const MASK_24: u32 = 0xFF_FFFF;

/// Decode a 24-bit two's-complement word into a signed value.
///
/// Only the low 24 bits of `raw` are considered. Bit 23 set yields a value in
/// `[RAW_MIN, -1]`, clear yields `[0, RAW_MAX]`.
#[inline]
pub fn decode_twos_complement_24(raw: u32) -> i32 {
    let raw = raw & MASK_24;
    if raw & SIGN_BIT != 0 {
        raw as i32 - 0x100_0000
    } else {
        raw as i32
    }
}

/// Gain / channel selection, encoded as extra SCK pulses after the data bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    /// Channel A, gain 128 (1 extra pulse).
    #[default]
    A128,
    /// Channel A, gain 64 (3 extra pulses).
    A64,
    /// Channel B, gain 32 (2 extra pulses).
    B32,
}

impl Gain {
    #[inline]
    pub fn extra_pulses(self) -> u8 {
        match self {
            Gain::A128 => 1,
            Gain::B32 => 2,
            Gain::A64 => 3,
        }
    }

    /// Map a numeric gain from configuration; anything unknown becomes 128.
    pub fn from_factor(factor: u32) -> Self {
        match factor {
            128 => Gain::A128,
            64 => Gain::A64,
            32 => Gain::B32,
            other => {
                warn!(gain = other, "unsupported HX711 gain, using 128");
                Gain::A128
            }
        }
    }
}

/// Protocol timing knobs.
#[derive(Debug, Clone)]
pub struct Hx711Timing {
    /// Ready-line polls before giving up.
    pub ready_polls: u32,
    /// Pause between ready-line polls.
    pub ready_poll: Duration,
    /// How long SCK is held for power-down / power-up.
    pub power_hold: Duration,
    /// Settle time after start-up before the first real conversion.
    pub settle: Duration,
}

impl Default for Hx711Timing {
    fn default() -> Self {
        Self {
            ready_polls: 1000,
            ready_poll: Duration::from_millis(1),
            power_hold: Duration::from_millis(10),
            settle: Duration::from_millis(500),
        }
    }
}

pub struct Hx711<I, O, C> {
    dout: I,
    sck: O,
    clock: C,
    gain: Gain,
    timing: Hx711Timing,
    cancel: Option<CancelToken>,
}

impl<I: InputLine, O: OutputLine, C: Clock> Hx711<I, O, C> {
    /// Wrap the two lines. No I/O happens until [`Hx711::start`].
    pub fn new(dout: I, sck: O, clock: C, gain: Gain, timing: Hx711Timing) -> Self {
        Self {
            dout,
            sck,
            clock,
            gain,
            timing,
            cancel: None,
        }
    }

    /// Abort ready-polls early when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bring the chip to a known state: clock idle low, power cycle, apply
    /// the configured gain, then let the first conversion settle.
    pub fn start(&mut self) -> Result<()> {
        self.sck.set_low().map_err(HwError::gpio)?;
        self.power_down()?;
        self.power_up()?;
        self.set_gain(self.gain)?;
        self.clock.sleep(self.timing.settle);
        debug!(gain = ?self.gain, "hx711 started");
        Ok(())
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Record the gain for the next conversion and latch it with one
    /// throwaway read. The new gain applies from the following conversion on.
    pub fn set_gain(&mut self, gain: Gain) -> Result<()> {
        self.gain = gain;
        self.sck.set_low().map_err(HwError::gpio)?;
        match self.read_raw() {
            Ok(_) | Err(HwError::DataReadyTimeout) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read one conversion.
    ///
    /// A chip that never signals ready within the poll budget yields
    /// `DataReadyTimeout` after logging a wiring warning.
    pub fn read_raw(&mut self) -> Result<i32> {
        let Self {
            dout,
            clock,
            timing,
            cancel,
            ..
        } = self;
        let ready = wait_until_low(
            || Ok(dout.read().map_err(HwError::gpio)?.is_high()),
            timing.ready_polls,
            timing.ready_poll,
            &*clock,
            cancel.as_ref(),
        );
        if let Err(e) = ready {
            if matches!(e, HwError::DataReadyTimeout) {
                warn!(
                    polls = self.timing.ready_polls,
                    "HX711 not ready - check wiring"
                );
            }
            return Err(e);
        }

        let mut word: u32 = 0;
        for _ in 0..24 {
            self.sck.set_high().map_err(HwError::gpio)?;
            spin_delay();
            let bit = self.dout.read().map_err(HwError::gpio)?;
            word = (word << 1) | u32::from(bit == Level::High);
            self.sck.set_low().map_err(HwError::gpio)?;
            spin_delay();
        }

        for _ in 0..self.gain.extra_pulses() {
            self.sck.set_high().map_err(HwError::gpio)?;
            spin_delay();
            self.sck.set_low().map_err(HwError::gpio)?;
            spin_delay();
        }

        let value = decode_twos_complement_24(word);
        trace!(raw = value, "hx711 raw read");
        Ok(value)
    }

    /// SCK high for at least `power_hold` puts the chip to sleep.
    pub fn power_down(&mut self) -> Result<()> {
        self.sck.set_low().map_err(HwError::gpio)?;
        self.sck.set_high().map_err(HwError::gpio)?;
        self.clock.sleep(self.timing.power_hold);
        Ok(())
    }

    pub fn power_up(&mut self) -> Result<()> {
        self.sck.set_low().map_err(HwError::gpio)?;
        self.clock.sleep(self.timing.power_hold);
        Ok(())
    }
}

impl<I: InputLine, O: OutputLine, C: Clock> Adc for Hx711<I, O, C> {
    fn read_raw(&mut self) -> std::result::Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Hx711::read_raw(self)?)
    }

    fn power_down(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(Hx711::power_down(self)?)
    }
}

#[inline(always)]
fn spin_delay() {
    // The HX711 needs only ~0.2 us per phase; GPIO call latency covers it.
    std::hint::spin_loop();
}
