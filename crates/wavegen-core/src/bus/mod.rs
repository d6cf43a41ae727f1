//! Software-clocked SPI bus configuration and the per-bit edge tables.
//!
//! A bus is three output lines (clock, data-out, active-low chip select).
//! Clock polarity sets the idle clock level; clock phase picks which of the
//! two clock transitions in a bit period the receiver samples on.

mod channel;

pub use channel::BitBangSpi;

use wavegen_hal::Level;

/// One GPIO write inside a bit period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Drive the data line to the current bit.
    Data,
    /// Drive the clock line away from its idle level.
    ClockActive,
    /// Return the clock line to its idle level.
    ClockIdle,
}

/// CPHA=0: data is stable before the leading (sampling) edge.
pub const SAMPLE_ON_FIRST_EDGE: [Step; 3] = [Step::Data, Step::ClockActive, Step::ClockIdle];

/// CPHA=1: data changes between the edges; the return-to-idle edge samples.
pub const SAMPLE_ON_SECOND_EDGE: [Step; 3] = [Step::ClockActive, Step::Data, Step::ClockIdle];

/// Which clock transition of a bit period the receiver samples on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    /// CPHA=0.
    FirstEdge,
    /// CPHA=1.
    SecondEdge,
}

impl ClockPhase {
    /// Ordered GPIO writes for one bit.
    pub const fn steps(self) -> &'static [Step; 3] {
        match self {
            ClockPhase::FirstEdge => &SAMPLE_ON_FIRST_EDGE,
            ClockPhase::SecondEdge => &SAMPLE_ON_SECOND_EDGE,
        }
    }

    /// The step after which the receiver latches the data line.
    pub const fn sampling_step(self) -> Step {
        match self {
            ClockPhase::FirstEdge => Step::ClockActive,
            ClockPhase::SecondEdge => Step::ClockIdle,
        }
    }
}

/// Bit transmission order within a 16-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    /// Bit of `word` sent at position `index` (0 = first on the wire).
    /// `index` must be below 16.
    pub(crate) const fn bit(self, word: u16, index: u32) -> Level {
        debug_assert!(index < 16);
        let shift = match self {
            BitOrder::MsbFirst => 15 - index,
            BitOrder::LsbFirst => index,
        };
        Level::from_bit(word >> shift)
    }
}

/// Standard SPI mode numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Clock level between frames (CPOL).
    pub const fn idle_clock(self) -> Level {
        match self {
            SpiMode::Mode0 | SpiMode::Mode1 => Level::Low,
            SpiMode::Mode2 | SpiMode::Mode3 => Level::High,
        }
    }

    pub const fn phase(self) -> ClockPhase {
        match self {
            SpiMode::Mode0 | SpiMode::Mode2 => ClockPhase::FirstEdge,
            SpiMode::Mode1 | SpiMode::Mode3 => ClockPhase::SecondEdge,
        }
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = u8;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(other),
        }
    }
}

/// Pin assignment and signalling of one bus. Fixed once the bus is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub sck: u8,
    pub mosi: u8,
    pub cs: u8,
    pub idle_clock: Level,
    pub phase: ClockPhase,
    pub bit_order: BitOrder,
}

impl BusConfig {
    /// MSB-first configuration for the given pins and SPI mode.
    pub const fn new(sck: u8, mosi: u8, cs: u8, mode: SpiMode) -> Self {
        Self {
            sck,
            mosi,
            cs,
            idle_clock: mode.idle_clock(),
            phase: mode.phase(),
            bit_order: BitOrder::MsbFirst,
        }
    }

    pub const fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Clock level during the first half of a bit period.
    pub const fn active_clock(&self) -> Level {
        self.idle_clock.inverted()
    }

    /// Reconstruct the SPI mode number from polarity and phase.
    pub const fn mode(&self) -> SpiMode {
        match (self.idle_clock, self.phase) {
            (Level::Low, ClockPhase::FirstEdge) => SpiMode::Mode0,
            (Level::Low, ClockPhase::SecondEdge) => SpiMode::Mode1,
            (Level::High, ClockPhase::FirstEdge) => SpiMode::Mode2,
            (Level::High, ClockPhase::SecondEdge) => SpiMode::Mode3,
        }
    }

    /// Reject configurations where two bus roles share a line.
    pub fn validate<E>(&self) -> Result<(), BusError<E>> {
        if self.sck == self.mosi || self.sck == self.cs {
            return Err(BusError::PinConflict(self.sck));
        }
        if self.mosi == self.cs {
            return Err(BusError::PinConflict(self.mosi));
        }
        Ok(())
    }
}

/// Errors from building or driving a bit-banged bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError<E> {
    /// The same pin is assigned to more than one bus role.
    PinConflict(u8),
    /// A GPIO write failed. Line state is unknown afterwards.
    Gpio(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for BusError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusError::PinConflict(pin) => write!(f, "pin {pin} assigned to more than one bus line"),
            BusError::Gpio(e) => write!(f, "GPIO error: {e:?}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for BusError<E> {}
