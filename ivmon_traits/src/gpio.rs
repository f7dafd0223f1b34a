//! Minimal digital GPIO transport.
//!
//! Configuring a pin's direction is modelled as claiming it from a [`Gpio`]
//! provider as an input or an output line. A claimed line has a single owner,
//! which is what lets the blink thread and the monitoring loop run without
//! sharing any mutable state.

/// Digital level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    #[inline]
    pub fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

pub trait InputLine {
    fn read(&mut self) -> Result<Level, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait OutputLine {
    fn write(&mut self, level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    #[inline]
    fn set_high(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write(Level::High)
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write(Level::Low)
    }
}

impl<L: InputLine + ?Sized> InputLine for Box<L> {
    fn read(&mut self) -> Result<Level, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<L: OutputLine + ?Sized> OutputLine for Box<L> {
    fn write(&mut self, level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(level)
    }
}

/// Pin provider. `input`/`output` play the role of `set_pin_mode`.
pub trait Gpio {
    type Input: InputLine + Send + 'static;
    type Output: OutputLine + Send + 'static;

    fn input(&self, pin: u8) -> Result<Self::Input, Box<dyn std::error::Error + Send + Sync>>;
    fn output(&self, pin: u8) -> Result<Self::Output, Box<dyn std::error::Error + Send + Sync>>;
}
