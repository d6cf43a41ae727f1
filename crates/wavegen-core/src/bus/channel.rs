use wavegen_hal::{GpioPort, Level, WordTransport};

use super::{BusConfig, BusError, Step};

/// Bits per frame. Only 16-bit words are supported.
const WORD_BITS: u32 = 16;

/// Blocking SPI master that clocks each bit out by toggling GPIO lines.
///
/// Owns its GPIO port exclusively. Each transfer is one frame: chip select
/// low, 16 bits, chip select high.
pub struct BitBangSpi<G: GpioPort> {
    gpio: G,
    config: BusConfig,
}

impl<G: GpioPort> BitBangSpi<G> {
    /// Configure the three bus lines as outputs and park them idle:
    /// CS high, SCK at the idle level, MOSI low.
    pub fn new(mut gpio: G, config: BusConfig) -> Result<Self, BusError<G::Error>> {
        config.validate::<G::Error>()?;

        for pin in [config.sck, config.mosi, config.cs] {
            gpio.configure_output(pin).map_err(BusError::Gpio)?;
        }
        gpio.write_level(config.cs, Level::High)
            .map_err(BusError::Gpio)?;
        gpio.write_level(config.sck, config.idle_clock)
            .map_err(BusError::Gpio)?;
        gpio.write_level(config.mosi, Level::Low)
            .map_err(BusError::Gpio)?;

        log::debug!(
            "bit-bang bus ready: sck={} mosi={} cs={} {:?} {:?}",
            config.sck,
            config.mosi,
            config.cs,
            config.mode(),
            config.bit_order
        );

        Ok(Self { gpio, config })
    }

    /// Send one 16-bit word as a single frame.
    ///
    /// The first GPIO error aborts the frame and is returned as is; chip
    /// select may be left asserted.
    pub fn transfer(&mut self, word: u16) -> Result<(), G::Error> {
        let BusConfig {
            sck,
            mosi,
            cs,
            idle_clock,
            phase,
            bit_order,
        } = self.config;
        let active_clock = self.config.active_clock();

        self.gpio.write_level(cs, Level::Low)?;
        for index in 0..WORD_BITS {
            let bit = bit_order.bit(word, index);
            for step in phase.steps() {
                match step {
                    Step::Data => self.gpio.write_level(mosi, bit)?,
                    Step::ClockActive => self.gpio.write_level(sck, active_clock)?,
                    Step::ClockIdle => self.gpio.write_level(sck, idle_clock)?,
                }
            }
        }
        self.gpio.write_level(cs, Level::High)?;

        log::trace!("frame 0x{word:04X}");
        Ok(())
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Give the GPIO port back. Lines stay at their idle levels.
    pub fn release(self) -> G {
        self.gpio
    }
}

impl<G: GpioPort> WordTransport for BitBangSpi<G> {
    type Error = G::Error;

    fn write_word(&mut self, word: u16) -> Result<(), Self::Error> {
        self.transfer(word)
    }
}
