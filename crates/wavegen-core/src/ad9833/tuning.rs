//! Frequency and phase word arithmetic.
//!
//! f_out = word * f_mclk / 2^28, so one LSB is f_mclk / 2^28
//! (about 0.093 Hz at 25 MHz).

use super::registers::{
    FREQ_HALF_BITS, FREQ_HALF_MASK, PHASE_ADDR, PHASE_MASK, PHASE_SELECT, TUNING_WORD_BITS,
    TUNING_WORD_MAX,
};
use super::Channel;

const TWO_POW_28: f64 = (1u32 << TUNING_WORD_BITS) as f64;
const PHASE_STEPS: f64 = 4096.0;

/// Tuning word for `freq_hz` at master clock `mclk_hz`: `round(freq * 2^28 / mclk)`.
///
/// Returns `None` for negative or non-finite input and for results that do
/// not fit in 28 bits. Out-of-range requests are never wrapped or clamped.
pub fn tuning_word(freq_hz: f64, mclk_hz: u32) -> Option<u32> {
    if !freq_hz.is_finite() || freq_hz < 0.0 || mclk_hz == 0 {
        return None;
    }
    let word = libm::round(freq_hz * TWO_POW_28 / mclk_hz as f64);
    if word > TUNING_WORD_MAX as f64 {
        return None;
    }
    Some(word as u32)
}

/// Frequency actually produced by `word`.
pub fn output_frequency(word: u32, mclk_hz: u32) -> f64 {
    (word & TUNING_WORD_MAX) as f64 * mclk_hz as f64 / TWO_POW_28
}

/// Highest frequency that still rounds to a 28-bit word.
pub fn max_frequency(mclk_hz: u32) -> f64 {
    output_frequency(TUNING_WORD_MAX, mclk_hz)
}

/// Split a tuning word into its (LSB, MSB) 14-bit halves, untagged.
pub const fn split_tuning_word(word: u32) -> (u16, u16) {
    let lsb = (word as u16) & FREQ_HALF_MASK;
    let msb = ((word >> FREQ_HALF_BITS) as u16) & FREQ_HALF_MASK;
    (lsb, msb)
}

/// Inverse of [`split_tuning_word`]. Address bits, if present, are dropped.
pub const fn join_tuning_word(lsb: u16, msb: u16) -> u32 {
    (((msb & FREQ_HALF_MASK) as u32) << FREQ_HALF_BITS) | (lsb & FREQ_HALF_MASK) as u32
}

/// The two bus words that load `word` into `channel`'s frequency register,
/// in transmission order (LSB half first).
pub const fn frequency_words(channel: Channel, word: u32) -> [u16; 2] {
    let addr = channel.freq_address();
    let (lsb, msb) = split_tuning_word(word);
    [addr | lsb, addr | msb]
}

/// 12-bit phase offset for `degrees`, wrapped into one turn.
pub fn phase_offset(degrees: f64) -> Option<u16> {
    if !degrees.is_finite() {
        return None;
    }
    let turns = degrees / 360.0;
    let steps = libm::round((turns - libm::floor(turns)) * PHASE_STEPS) as u32;
    Some((steps as u16) & PHASE_MASK)
}

/// The bus word that loads `offset` into `channel`'s phase register.
pub const fn phase_word(channel: Channel, offset: u16) -> u16 {
    let select = match channel {
        Channel::Zero => 0,
        Channel::One => PHASE_SELECT,
    };
    PHASE_ADDR | select | (offset & PHASE_MASK)
}
