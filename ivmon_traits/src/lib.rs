//! Hardware seams shared by the ivmon crates.
//!
//! The core never touches a GPIO register directly. It talks to an [`Adc`]
//! for raw counts and to [`OutputLine`]s for indicators; the hardware crate
//! supplies real or simulated implementations.

pub mod cancel;
pub mod clock;
pub mod gpio;

pub use cancel::CancelToken;
pub use clock::{Clock, MonotonicClock};
pub use gpio::{Gpio, InputLine, Level, OutputLine};

/// Source of raw 24-bit conversions (one protocol cycle per call).
pub trait Adc {
    fn read_raw(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;

    /// Put the converter in its low-power state. Called once on teardown.
    fn power_down(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<A: Adc + ?Sized> Adc for Box<A> {
    fn read_raw(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_raw()
    }

    fn power_down(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).power_down()
    }
}
