//! Virtual GPIO bridge that records every line change, plus a small logic
//! analyzer that turns the recording back into bus words.
//!
//! Stands in for the USB bridge's GPIO mode: same pin numbering (0..=7),
//! same rule that a line must be configured as output before it is driven.

use wavegen_core::bus::{BitOrder, BusConfig, Step};
use wavegen_hal::{GpioPort, Level};

/// Number of GPIO lines on the bridge.
pub const LINES: u8 = 8;

/// Recording GPIO errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    /// Pin index past the last bridge line.
    #[error("pin {0} does not exist (lines 0..=7)")]
    NoSuchPin(u8),

    /// Pin driven before `configure_output`.
    #[error("pin {0} written before being configured as an output")]
    NotOutput(u8),

    /// Fault injected with [`TraceGpio::fail_after`].
    #[error("injected GPIO fault after {0} writes")]
    Injected(usize),
}

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub pin: u8,
    pub level: Level,
}

#[derive(Debug, Default)]
pub struct TraceGpio {
    outputs: u8,
    events: Vec<PinEvent>,
    fail_after: Option<usize>,
}

impl TraceGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write after the first `writes` succeed.
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    pub fn events(&self) -> &[PinEvent] {
        &self.events
    }

    /// Last level driven on `pin`.
    #[cfg(test)]
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.events
            .iter()
            .rev()
            .find(|e| e.pin == pin)
            .map(|e| e.level)
    }

    fn check_pin(pin: u8) -> Result<(), TraceError> {
        if pin >= LINES {
            return Err(TraceError::NoSuchPin(pin));
        }
        Ok(())
    }
}

impl GpioPort for TraceGpio {
    type Error = TraceError;

    fn configure_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        self.outputs |= 1 << pin;
        log::trace!("pin {pin} -> output");
        Ok(())
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Self::Error> {
        Self::check_pin(pin)?;
        if self.outputs & (1 << pin) == 0 {
            return Err(TraceError::NotOutput(pin));
        }
        if let Some(limit) = self.fail_after {
            if self.events.len() >= limit {
                return Err(TraceError::Injected(limit));
            }
        }
        self.events.push(PinEvent { pin, level });
        Ok(())
    }
}

/// Replay `events` as a receiver would see them and return every complete
/// 16-bit frame. Data is latched on the sampling edge implied by `config`;
/// frames that end early are dropped.
pub fn decode_frames(events: &[PinEvent], config: &BusConfig) -> Vec<u16> {
    let idle = config.idle_clock;
    let active = config.active_clock();
    let sampling_step = config.phase.sampling_step();
    let mut words = Vec::new();
    let mut sck = config.idle_clock;
    let mut mosi = Level::Low;
    let mut selected = false;
    let mut word = 0u16;
    let mut bits = 0u32;

    for event in events {
        if event.pin == config.cs {
            match event.level {
                Level::Low => {
                    selected = true;
                    word = 0;
                    bits = 0;
                }
                Level::High => {
                    if selected && bits == 16 {
                        words.push(word);
                    } else if selected {
                        log::warn!("dropping partial frame ({bits} bits)");
                    }
                    selected = false;
                }
            }
        } else if event.pin == config.mosi {
            mosi = event.level;
        } else if event.pin == config.sck {
            let previous = sck;
            sck = event.level;
            let sampling = match sampling_step {
                Step::ClockActive => previous == idle && sck == active,
                Step::ClockIdle => previous == active && sck == idle,
                Step::Data => false,
            };
            if selected && sampling && bits < 16 {
                let bit = mosi.is_high() as u16;
                match config.bit_order {
                    BitOrder::MsbFirst => word = (word << 1) | bit,
                    BitOrder::LsbFirst => word |= bit << bits,
                }
                bits += 1;
            }
        }
    }
    words
}

/// ASCII timing diagram of the first frame in `events`: one column per
/// write, `-` high and `_` low, starting with the pre-frame state.
pub fn render_frame(events: &[PinEvent], config: &BusConfig) -> Option<String> {
    let is_cs = |e: &PinEvent, level: Level| e.pin == config.cs && e.level == level;
    let start = events.iter().position(|e| is_cs(e, Level::Low))?;
    let end = start + events[start..].iter().position(|e| is_cs(e, Level::High))?;

    let pins = [config.cs, config.sck, config.mosi];
    let mut levels = [Level::High, config.idle_clock, Level::Low];
    let apply = |levels: &mut [Level; 3], event: &PinEvent| {
        if let Some(row) = pins.iter().position(|p| *p == event.pin) {
            levels[row] = event.level;
        }
    };
    for event in &events[..start] {
        apply(&mut levels, event);
    }

    let mut rows = [String::new(), String::new(), String::new()];
    let mut push = |levels: &[Level; 3]| {
        for (row, level) in rows.iter_mut().zip(levels) {
            row.push(if level.is_high() { '-' } else { '_' });
        }
    };
    push(&levels);
    for event in &events[start..=end] {
        apply(&mut levels, event);
        push(&levels);
    }

    Some(format!(
        "CS   {}\nSCK  {}\nMOSI {}",
        rows[0], rows[1], rows[2]
    ))
}
