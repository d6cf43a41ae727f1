//! AD9833 programmable waveform generator.
//!
//! The device is write-only: its configuration lives in a 16-bit control
//! register, two 28-bit frequency registers and two 12-bit phase
//! registers, all loaded through 16-bit serial words.

mod driver;
pub mod registers;
pub mod tuning;
mod waveform;

pub use driver::{Ad9833, Ad9833Config, Error, Timing};
pub use registers::Control;
pub use waveform::{ParseWaveformError, Waveform};

use registers::{FREQ0_ADDR, FREQ1_ADDR};

/// One of the two frequency/phase register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Zero,
    One,
}

impl Channel {
    /// Address bits of this bank's frequency register.
    pub const fn freq_address(self) -> u16 {
        match self {
            Channel::Zero => FREQ0_ADDR,
            Channel::One => FREQ1_ADDR,
        }
    }

    pub const fn index(self) -> u8 {
        match self {
            Channel::Zero => 0,
            Channel::One => 1,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Channel::Zero),
            1 => Ok(Channel::One),
            other => Err(other),
        }
    }
}
