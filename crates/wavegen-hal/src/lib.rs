#![no_std]

/// Logic level of a single GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Level for the least significant bit of `bit` (0 = Low, anything odd = High).
    pub const fn from_bit(bit: u16) -> Self {
        if bit & 1 == 0 {
            Level::Low
        } else {
            Level::High
        }
    }

    /// The opposite level.
    pub const fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// Abstracts a pin-addressed GPIO port, such as the GPIO mode of a USB
/// bus bridge.
///
/// Only output lines are needed: the waveform generator is write-only.
pub trait GpioPort {
    type Error: core::fmt::Debug;

    /// Configure `pin` as a push-pull output.
    fn configure_output(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Drive `pin` to `level`.
    ///
    /// Implementations MUST apply writes in call order. A returned error
    /// means the line state is unknown.
    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Self::Error>;
}

/// Abstracts the transmission of one chip-select-bounded 16-bit frame.
///
/// The device controller only needs this seam, so it can run over a
/// bit-banged bus, a hardware SPI peripheral, or a recording mock.
pub trait WordTransport {
    type Error: core::fmt::Debug;

    /// Send one 16-bit word as a single frame. Blocks until the frame ends.
    fn write_word(&mut self, word: u16) -> Result<(), Self::Error>;
}
