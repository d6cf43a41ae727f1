use core::fmt;
use core::str::FromStr;

use super::Control;

/// Output waveform, as encoded in the control register mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    /// Comparator output at the DDS frequency.
    Square1,
    /// Comparator output at half the DDS frequency.
    Square2,
    /// MCLK stopped and DAC powered down.
    Off,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square1,
        Waveform::Square2,
        Waveform::Off,
    ];

    /// Mode bit pattern. Always a subset of [`Control::MODE_MASK`].
    pub const fn bits(self) -> Control {
        match self {
            Waveform::Sine => Control::empty(),
            Waveform::Triangle => Control::MODE,
            Waveform::Square1 => Control::OPBITEN.union(Control::DIV2),
            Waveform::Square2 => Control::OPBITEN,
            Waveform::Off => Control::SLEEP1.union(Control::SLEEP12),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "SINE",
            Waveform::Triangle => "TRIANGLE",
            Waveform::Square1 => "SQUARE1",
            Waveform::Square2 => "SQUARE2",
            Waveform::Off => "OFF",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown waveform name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseWaveformError;

impl fmt::Display for ParseWaveformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown waveform (expected SINE/SIN, TRIANGLE/TRI, SQUARE1/SQ1, SQUARE2/SQ2 or OFF)")
    }
}

impl core::error::Error for ParseWaveformError {}

impl FromStr for Waveform {
    type Err = ParseWaveformError;

    /// Case-insensitive full names and the short forms SIN, TRI, SQ1, SQ2.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [(&str, Waveform); 9] = [
            ("SINE", Waveform::Sine),
            ("SIN", Waveform::Sine),
            ("TRIANGLE", Waveform::Triangle),
            ("TRI", Waveform::Triangle),
            ("SQUARE1", Waveform::Square1),
            ("SQ1", Waveform::Square1),
            ("SQUARE2", Waveform::Square2),
            ("SQ2", Waveform::Square2),
            ("OFF", Waveform::Off),
        ];

        let s = s.trim();
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, waveform)| waveform)
            .ok_or(ParseWaveformError)
    }
}
