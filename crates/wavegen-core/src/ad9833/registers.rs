//! AD9833 register map.
//!
//! Every 16-bit word carries its destination in D15..D14:
//! `00` control, `01` FREQ0, `10` FREQ1, `11` phase (D13 picks PHASE0/1).

use bitflags::bitflags;

use super::Waveform;

bitflags! {
    /// The control register (D15..D14 = 00).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Control: u16 {
        /// Frequency writes load all 28 bits as two consecutive words.
        const B28 = 1 << 13;
        /// With B28 clear, selects the MSB (1) or LSB (0) half of a frequency register.
        const HLB = 1 << 12;
        /// Output from FREQ1 instead of FREQ0.
        const FSELECT = 1 << 11;
        /// Output from PHASE1 instead of PHASE0.
        const PSELECT = 1 << 10;
        /// Hold the phase accumulator at zero.
        const RESET = 1 << 8;
        /// Stop the internal MCLK.
        const SLEEP1 = 1 << 7;
        /// Power down the DAC.
        const SLEEP12 = 1 << 6;
        /// Route the MSB (comparator) to VOUT instead of the DAC.
        const OPBITEN = 1 << 5;
        /// Output MSB directly instead of MSB/2 when OPBITEN is set.
        const DIV2 = 1 << 3;
        /// Triangle instead of sine when OPBITEN is clear.
        const MODE = 1 << 1;

        /// Every bit a waveform selection may touch.
        const MODE_MASK = Self::SLEEP1.bits()
            | Self::SLEEP12.bits()
            | Self::OPBITEN.bits()
            | Self::DIV2.bits()
            | Self::MODE.bits();
    }
}

impl Control {
    /// Clear the mode mask and OR in `waveform`'s pattern. Every other bit,
    /// known or not, is carried over unchanged.
    pub const fn with_mode(self, waveform: Waveform) -> Self {
        Self::from_bits_retain((self.bits() & !Self::MODE_MASK.bits()) | waveform.bits().bits())
    }

    /// The waveform currently selected by the mode bits, if the pattern is
    /// one of the named ones.
    pub fn waveform(self) -> Option<Waveform> {
        let bits = self.intersection(Self::MODE_MASK);
        Waveform::ALL.into_iter().find(|w| w.bits() == bits)
    }
}

/// Address bits for a FREQ0 write.
pub const FREQ0_ADDR: u16 = 0b01 << 14;
/// Address bits for a FREQ1 write.
pub const FREQ1_ADDR: u16 = 0b10 << 14;
/// Address bits for a phase register write.
pub const PHASE_ADDR: u16 = 0b11 << 14;
/// Phase register select within a phase write (0 = PHASE0, 1 = PHASE1).
pub const PHASE_SELECT: u16 = 1 << 13;
/// Mask of the address field.
pub const ADDR_MASK: u16 = 0b11 << 14;

/// Payload bits per frequency half-word.
pub const FREQ_HALF_BITS: u32 = 14;
/// Mask of one frequency half-word payload.
pub const FREQ_HALF_MASK: u16 = 0x3FFF;
/// Width of a frequency tuning word.
pub const TUNING_WORD_BITS: u32 = 28;
/// Largest loadable tuning word.
pub const TUNING_WORD_MAX: u32 = (1 << TUNING_WORD_BITS) - 1;
/// Mask of a phase register payload.
pub const PHASE_MASK: u16 = 0x0FFF;
