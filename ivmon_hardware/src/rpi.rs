//! Raspberry Pi GPIO through rppal.

use ivmon_traits::{Gpio, InputLine, Level, OutputLine};
use rppal::gpio::{self, InputPin, OutputPin};

use crate::error::{HwError, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// BCM-numbered pin provider.
#[derive(Clone)]
pub struct RpiGpio {
    gpio: gpio::Gpio,
}

impl RpiGpio {
    pub fn open() -> Result<Self> {
        let gpio = gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self { gpio })
    }
}

pub struct RpiInput(InputPin);
pub struct RpiOutput(OutputPin);

impl InputLine for RpiInput {
    fn read(&mut self) -> std::result::Result<Level, BoxError> {
        Ok(match self.0.read() {
            gpio::Level::High => Level::High,
            gpio::Level::Low => Level::Low,
        })
    }
}

impl OutputLine for RpiOutput {
    fn write(&mut self, level: Level) -> std::result::Result<(), BoxError> {
        match level {
            Level::High => self.0.set_high(),
            Level::Low => self.0.set_low(),
        }
        Ok(())
    }
}

impl Gpio for RpiGpio {
    type Input = RpiInput;
    type Output = RpiOutput;

    fn input(&self, pin: u8) -> std::result::Result<RpiInput, BoxError> {
        Ok(RpiInput(self.gpio.get(pin)?.into_input()))
    }

    fn output(&self, pin: u8) -> std::result::Result<RpiOutput, BoxError> {
        let mut out = self.gpio.get(pin)?.into_output();
        // rppal restores the previous pin state on drop; indicators must stay off.
        out.set_reset_on_drop(false);
        out.set_low();
        Ok(RpiOutput(out))
    }
}
