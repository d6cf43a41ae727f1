//! Platform-agnostic control of an AD9833 waveform generator over a
//! software-clocked serial bus.
//!
//! Two layers, each usable alone:
//! - [`bus`]: a bit-banged SPI master over three GPIO lines, any CPOL/CPHA,
//!   either bit order.
//! - [`ad9833`]: the device register model and command sequencing, generic
//!   over any [`WordTransport`](wavegen_hal::WordTransport).

#![no_std]

pub mod ad9833;
pub mod bus;
pub mod pins;

pub use ad9833::{Ad9833, Ad9833Config, Channel, Control, Error, Timing, Waveform};
pub use bus::{BitBangSpi, BitOrder, BusConfig, BusError, ClockPhase, SpiMode};
pub use wavegen_hal::{GpioPort, Level, WordTransport};
