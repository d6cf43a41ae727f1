//! AD9833 driver, generic over a word transport and a delay provider.

use embedded_hal::delay::DelayNs;
use fugit::{HertzU32, MicrosDurationU32};
use wavegen_hal::WordTransport;

use super::tuning;
use super::{Channel, Control, Waveform};

/// Error type for driver operations, generic over transport errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error<E> {
    /// The transport failed mid-sequence. The device may hold a partial update.
    ///
    /// The shadow control register keeps the bits of the failed write, so a
    /// failed [`Ad9833::reset`] leaves `RESET` set and later control writes
    /// repeat it. [`Ad9833::begin`] restores a known state.
    Transport(E),
    /// Channel index other than 0 or 1. Nothing was transmitted.
    InvalidChannel(u8),
    /// Frequency is negative, not finite, or needs more than 28 bits.
    /// Nothing was transmitted.
    FrequencyOutOfRange { hz: f64 },
    /// Phase is not finite. Nothing was transmitted.
    InvalidPhase,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {e:?}"),
            Error::InvalidChannel(ch) => write!(f, "invalid channel {ch} (must be 0 or 1)"),
            Error::FrequencyOutOfRange { hz } => {
                write!(f, "frequency {hz} Hz does not fit a 28-bit tuning word")
            }
            Error::InvalidPhase => f.write_str("phase must be a finite number of degrees"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

/// Device setup times. Either may be zero in tests; on hardware they are
/// lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause after every transmitted word.
    pub word_gap: MicrosDurationU32,
    /// Hold time with RESET asserted.
    pub reset_settle: MicrosDurationU32,
}

impl Timing {
    pub const ZERO: Timing = Timing {
        word_gap: MicrosDurationU32::from_ticks(0),
        reset_settle: MicrosDurationU32::from_ticks(0),
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            word_gap: MicrosDurationU32::micros(10),
            reset_settle: MicrosDurationU32::millis(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ad9833Config {
    /// Master clock feeding the device.
    pub mclk: HertzU32,
    pub timing: Timing,
}

impl Default for Ad9833Config {
    fn default() -> Self {
        Self {
            mclk: HertzU32::MHz(25),
            timing: Timing::default(),
        }
    }
}

/// AD9833 driver. Owns the transport, the delay provider, and the shadow
/// copy of the control register.
///
/// The device cannot be read back, so `control` is the only record of its
/// configuration. Every command is a read-modify-write of that value
/// followed by transmission.
pub struct Ad9833<T: WordTransport, D: DelayNs> {
    transport: T,
    delay: D,
    config: Ad9833Config,
    control: Control,
}

impl<T: WordTransport, D: DelayNs> Ad9833<T, D> {
    /// Create a driver with an all-zero control register. Nothing is sent
    /// until [`begin`](Self::begin).
    pub fn new(transport: T, delay: D, config: Ad9833Config) -> Self {
        Self {
            transport,
            delay,
            config,
            control: Control::empty(),
        }
    }

    /// Current shadow of the control register.
    pub fn control(&self) -> Control {
        self.control
    }

    pub fn config(&self) -> &Ad9833Config {
        &self.config
    }

    /// Give back the transport and the delay provider.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Select 28-bit frequency writes (all other control bits cleared),
    /// then [`reset`](Self::reset). Run once after power-up.
    pub fn begin(&mut self) -> Result<(), Error<T::Error>> {
        self.control = Control::B28;
        self.send_control()?;
        self.reset()?;
        log::info!("AD9833 initialised (mclk {} Hz)", self.config.mclk.to_Hz());
        Ok(())
    }

    /// Pulse RESET: two control words with the settle time between them.
    pub fn reset(&mut self) -> Result<(), Error<T::Error>> {
        self.control.insert(Control::RESET);
        self.send_control()?;
        self.delay
            .delay_us(self.config.timing.reset_settle.to_micros());
        self.control.remove(Control::RESET);
        self.send_control()?;
        log::debug!("AD9833 reset");
        Ok(())
    }

    /// Switch the output waveform. Only the mode bits change.
    pub fn set_mode(&mut self, waveform: Waveform) -> Result<(), Error<T::Error>> {
        self.control = self.control.with_mode(waveform);
        self.send_control()?;
        log::debug!("waveform {waveform}");
        Ok(())
    }

    /// Load `freq_hz` into frequency register `channel`.
    ///
    /// Sends the control register, then the LSB and MSB halves. The output
    /// only follows if `channel` is the active frequency register.
    pub fn set_frequency(&mut self, channel: u8, freq_hz: f64) -> Result<(), Error<T::Error>> {
        let channel = Channel::try_from(channel).map_err(Error::InvalidChannel)?;
        let word = tuning::tuning_word(freq_hz, self.config.mclk.to_Hz())
            .ok_or(Error::FrequencyOutOfRange { hz: freq_hz })?;

        if !self.control.contains(Control::B28) {
            log::warn!("frequency write without B28 set; call begin() first");
        }

        let [lsb, msb] = tuning::frequency_words(channel, word);
        self.send_control()?;
        self.send(lsb)?;
        self.send(msb)?;
        log::debug!(
            "FREQ{} = {} Hz (word {word}, {:.3} Hz actual)",
            channel.index(),
            freq_hz,
            tuning::output_frequency(word, self.config.mclk.to_Hz())
        );
        Ok(())
    }

    /// Route frequency register `channel` to the output. Loaded tuning
    /// words are untouched.
    pub fn set_active_frequency(&mut self, channel: u8) -> Result<(), Error<T::Error>> {
        let channel = Channel::try_from(channel).map_err(Error::InvalidChannel)?;
        self.control.set(Control::FSELECT, channel == Channel::One);
        self.send_control()?;
        log::debug!("active frequency register FREQ{}", channel.index());
        Ok(())
    }

    /// Load a phase offset in degrees into phase register `channel`.
    pub fn set_phase(&mut self, channel: u8, degrees: f64) -> Result<(), Error<T::Error>> {
        let channel = Channel::try_from(channel).map_err(Error::InvalidChannel)?;
        let offset = tuning::phase_offset(degrees).ok_or(Error::InvalidPhase)?;
        self.send(tuning::phase_word(channel, offset))?;
        log::debug!("PHASE{} = {degrees} deg (offset {offset})", channel.index());
        Ok(())
    }

    /// Route phase register `channel` to the output.
    pub fn set_active_phase(&mut self, channel: u8) -> Result<(), Error<T::Error>> {
        let channel = Channel::try_from(channel).map_err(Error::InvalidChannel)?;
        self.control.set(Control::PSELECT, channel == Channel::One);
        self.send_control()?;
        log::debug!("active phase register PHASE{}", channel.index());
        Ok(())
    }

    /// Replace the whole control register and transmit it.
    pub fn load_control(&mut self, control: Control) -> Result<(), Error<T::Error>> {
        self.control = control;
        self.send_control()
    }

    /// Turn the output off before the bus is released.
    pub fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        self.set_mode(Waveform::Off)
    }

    fn send_control(&mut self) -> Result<(), Error<T::Error>> {
        self.send(self.control.bits())
    }

    /// Transmit one word, then hold the inter-word gap.
    fn send(&mut self, word: u16) -> Result<(), Error<T::Error>> {
        self.transport.write_word(word).map_err(Error::Transport)?;
        self.delay.delay_us(self.config.timing.word_gap.to_micros());
        log::trace!("sent 0x{word:04X}");
        Ok(())
    }
}
