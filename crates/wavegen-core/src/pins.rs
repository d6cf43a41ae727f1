//! [`GpioPort`] over three embedded-hal output pins.
//!
//! Lets [`BitBangSpi`](crate::BitBangSpi) run on any embedded-hal target,
//! not only on pin-addressed bridges.

use embedded_hal::digital::{Error as _, ErrorKind, OutputPin};
use wavegen_hal::{GpioPort, Level};

use crate::bus::{BusConfig, SpiMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// Pin index outside 0..=2.
    UnknownPin(u8),
    /// The HAL pin reported an error.
    Pin(ErrorKind),
}

/// Three owned output pins addressed as 0 (SCK), 1 (MOSI) and 2 (CS).
pub struct OutputPins<SCK, MOSI, CS> {
    sck: SCK,
    mosi: MOSI,
    cs: CS,
}

impl<SCK, MOSI, CS> OutputPins<SCK, MOSI, CS>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    CS: OutputPin,
{
    pub const SCK: u8 = 0;
    pub const MOSI: u8 = 1;
    pub const CS: u8 = 2;

    pub fn new(sck: SCK, mosi: MOSI, cs: CS) -> Self {
        Self { sck, mosi, cs }
    }

    /// Bus configuration matching this pin numbering.
    pub const fn bus_config(mode: SpiMode) -> BusConfig {
        BusConfig::new(Self::SCK, Self::MOSI, Self::CS, mode)
    }

    pub fn release(self) -> (SCK, MOSI, CS) {
        (self.sck, self.mosi, self.cs)
    }
}

fn drive<P: OutputPin>(pin: &mut P, level: Level) -> Result<(), PinError> {
    let result = match level {
        Level::Low => pin.set_low(),
        Level::High => pin.set_high(),
    };
    result.map_err(|e| PinError::Pin(e.kind()))
}

impl<SCK, MOSI, CS> GpioPort for OutputPins<SCK, MOSI, CS>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    CS: OutputPin,
{
    type Error = PinError;

    /// Pin direction is fixed by the HAL type; only the index is checked.
    fn configure_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        match pin {
            0..=2 => Ok(()),
            other => Err(PinError::UnknownPin(other)),
        }
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Self::Error> {
        match pin {
            0 => drive(&mut self.sck, level),
            1 => drive(&mut self.mosi, level),
            2 => drive(&mut self.cs, level),
            other => Err(PinError::UnknownPin(other)),
        }
    }
}
