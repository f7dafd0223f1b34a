//! HX711 driver plus the GPIO providers it runs on.
//!
//! `sim` is always available and backs tests and the CLI's simulation mode.
//! `rpi` wraps rppal and only builds with the `hardware` feature on Linux.

pub mod error;
pub mod hx711;
pub mod sim;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod rpi;

pub use error::HwError;
pub use hx711::{Gain, Hx711, Hx711Timing, decode_twos_complement_24};
pub use sim::{SimGpio, SimHandle, SimLoadCellParams};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use rpi::RpiGpio;
