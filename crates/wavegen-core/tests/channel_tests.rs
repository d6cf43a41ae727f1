//! Integration tests for the bit-banged SPI channel using a recording GPIO port.
//!
//! Golden traces list the (SCK, MOSI) levels after every write inside a
//! frame, three writes per bit, grouped per bit and separated by `|`.

use std::cell::RefCell;
use std::rc::Rc;

use wavegen_core::bus::{BitBangSpi, BitOrder, BusConfig, BusError, SpiMode};
use wavegen_core::pins::{OutputPins, PinError};
use wavegen_core::{GpioPort, Level, WordTransport};

const SCK: u8 = 3;
const MOSI: u8 = 5;
const CS: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GpioEvent {
    Configure(u8),
    Write(u8, Level),
}

#[derive(Debug, PartialEq, Eq)]
struct MockError;

/// GPIO port that records every call and can fail after N writes.
#[derive(Clone, Default)]
struct MockGpio {
    events: Rc<RefCell<Vec<GpioEvent>>>,
    writes_left: Rc<RefCell<Option<usize>>>,
}

impl MockGpio {
    fn failing_after(writes: usize) -> Self {
        let gpio = Self::default();
        *gpio.writes_left.borrow_mut() = Some(writes);
        gpio
    }

    fn events(&self) -> Vec<GpioEvent> {
        self.events.borrow().clone()
    }

    fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn writes(&self) -> Vec<(u8, Level)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                GpioEvent::Write(pin, level) => Some((pin, level)),
                GpioEvent::Configure(_) => None,
            })
            .collect()
    }
}

impl GpioPort for MockGpio {
    type Error = MockError;

    fn configure_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.events.borrow_mut().push(GpioEvent::Configure(pin));
        Ok(())
    }

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Self::Error> {
        if let Some(left) = self.writes_left.borrow_mut().as_mut() {
            if *left == 0 {
                return Err(MockError);
            }
            *left -= 1;
        }
        self.events.borrow_mut().push(GpioEvent::Write(pin, level));
        Ok(())
    }
}

fn bit(level: Level) -> char {
    if level.is_high() {
        '1'
    } else {
        '0'
    }
}

/// Render the SCK/MOSI writes of one frame. Asserts the frame is bounded
/// by exactly one CS assert and one CS release.
fn frame_trace(writes: &[(u8, Level)], idle_clock: Level) -> String {
    assert_eq!(writes.first(), Some(&(CS, Level::Low)), "frame must open with CS low");
    assert_eq!(writes.last(), Some(&(CS, Level::High)), "frame must close with CS high");
    let body = &writes[1..writes.len() - 1];
    assert!(body.iter().all(|(pin, _)| *pin != CS), "CS toggled mid-frame");
    assert_eq!(body.len(), 16 * 3);

    let mut sck = idle_clock;
    let mut mosi = Level::Low;
    let mut groups = Vec::new();
    for chunk in body.chunks(3) {
        let mut group = Vec::new();
        for &(pin, level) in chunk {
            match pin {
                SCK => sck = level,
                MOSI => mosi = level,
                other => panic!("unexpected pin {other}"),
            }
            group.push(format!("{}{}", bit(sck), bit(mosi)));
        }
        groups.push(group.join(" "));
    }
    groups.join("|")
}

fn run_frame(word: u16, config: BusConfig) -> String {
    let gpio = MockGpio::default();
    let mut spi = BitBangSpi::new(gpio.clone(), config).expect("bus setup");
    gpio.clear();
    spi.transfer(word).expect("transfer");
    frame_trace(&gpio.writes(), config.idle_clock)
}

fn golden(bits: [&str; 16]) -> String {
    bits.join("|")
}

// 0xB00C = 1011 0000 0000 1100

#[test]
fn mode0_golden_trace() {
    let trace = run_frame(0xB00C, BusConfig::new(SCK, MOSI, CS, SpiMode::Mode0));
    let expected = golden([
        "01 11 01", "00 10 00", "01 11 01", "01 11 01", "00 10 00", "00 10 00", "00 10 00",
        "00 10 00", "00 10 00", "00 10 00", "00 10 00", "00 10 00", "01 11 01", "01 11 01",
        "00 10 00", "00 10 00",
    ]);
    assert_eq!(trace, expected);
}

#[test]
fn mode1_golden_trace() {
    let trace = run_frame(0xB00C, BusConfig::new(SCK, MOSI, CS, SpiMode::Mode1));
    let expected = golden([
        "10 11 01", "11 10 00", "10 11 01", "11 11 01", "11 10 00", "10 10 00", "10 10 00",
        "10 10 00", "10 10 00", "10 10 00", "10 10 00", "10 10 00", "10 11 01", "11 11 01",
        "11 10 00", "10 10 00",
    ]);
    assert_eq!(trace, expected);
}

#[test]
fn mode2_golden_trace() {
    let trace = run_frame(0xB00C, BusConfig::new(SCK, MOSI, CS, SpiMode::Mode2));
    let expected = golden([
        "11 01 11", "10 00 10", "11 01 11", "11 01 11", "10 00 10", "10 00 10", "10 00 10",
        "10 00 10", "10 00 10", "10 00 10", "10 00 10", "10 00 10", "11 01 11", "11 01 11",
        "10 00 10", "10 00 10",
    ]);
    assert_eq!(trace, expected);
}

#[test]
fn mode3_golden_trace() {
    let trace = run_frame(0xB00C, BusConfig::new(SCK, MOSI, CS, SpiMode::Mode3));
    let expected = golden([
        "00 01 11", "01 00 10", "00 01 11", "01 01 11", "01 00 10", "00 00 10", "00 00 10",
        "00 00 10", "00 00 10", "00 00 10", "00 00 10", "00 00 10", "00 01 11", "01 01 11",
        "01 00 10", "00 00 10",
    ]);
    assert_eq!(trace, expected);
}

#[test]
fn lsb_first_golden_trace() {
    let config = BusConfig::new(SCK, MOSI, CS, SpiMode::Mode0).with_bit_order(BitOrder::LsbFirst);
    let trace = run_frame(0xB00C, config);
    let expected = golden([
        "00 10 00", "00 10 00", "01 11 01", "01 11 01", "00 10 00", "00 10 00", "00 10 00",
        "00 10 00", "00 10 00", "00 10 00", "00 10 00", "00 10 00", "01 11 01", "01 11 01",
        "00 10 00", "01 11 01",
    ]);
    assert_eq!(trace, expected);
}

#[test]
fn construction_parks_lines_idle() {
    for (mode, idle) in [
        (SpiMode::Mode0, Level::Low),
        (SpiMode::Mode1, Level::Low),
        (SpiMode::Mode2, Level::High),
        (SpiMode::Mode3, Level::High),
    ] {
        let gpio = MockGpio::default();
        BitBangSpi::new(gpio.clone(), BusConfig::new(SCK, MOSI, CS, mode)).expect("bus setup");
        assert_eq!(
            gpio.events(),
            vec![
                GpioEvent::Configure(SCK),
                GpioEvent::Configure(MOSI),
                GpioEvent::Configure(CS),
                GpioEvent::Write(CS, Level::High),
                GpioEvent::Write(SCK, idle),
                GpioEvent::Write(MOSI, Level::Low),
            ],
            "{mode:?}"
        );
    }
}

#[test]
fn clock_returns_to_idle_after_every_frame() {
    let config = BusConfig::new(SCK, MOSI, CS, SpiMode::Mode3);
    let gpio = MockGpio::default();
    let mut spi = BitBangSpi::new(gpio.clone(), config).expect("bus setup");
    for word in [0x0000, 0xFFFF, 0x2100] {
        gpio.clear();
        spi.transfer(word).expect("transfer");
        let last_sck = gpio
            .writes()
            .into_iter()
            .rev()
            .find(|(pin, _)| *pin == SCK)
            .map(|(_, level)| level);
        assert_eq!(last_sck, Some(Level::High));
    }
}

#[test]
fn shared_pin_is_rejected_before_any_gpio_call() {
    let gpio = MockGpio::default();
    let result = BitBangSpi::new(gpio.clone(), BusConfig::new(SCK, SCK, CS, SpiMode::Mode0));
    assert!(matches!(result, Err(BusError::PinConflict(SCK))));
    assert!(gpio.events().is_empty());
}

#[test]
fn gpio_failure_aborts_frame_without_retry() {
    // 3 setup writes, then CS low and 4 more writes succeed.
    let gpio = MockGpio::failing_after(3 + 5);
    let mut spi =
        BitBangSpi::new(gpio.clone(), BusConfig::new(SCK, MOSI, CS, SpiMode::Mode0)).expect("bus setup");
    assert_eq!(spi.transfer(0xFFFF), Err(MockError));

    let writes = gpio.writes();
    assert_eq!(writes.len(), 8);
    assert_eq!(writes[3], (CS, Level::Low));
    assert!(!writes[4..].contains(&(CS, Level::High)));

    // Nothing is written once the port has failed.
    assert_eq!(spi.transfer(0x0000), Err(MockError));
    assert_eq!(gpio.writes().len(), 8);
}

#[test]
fn setup_failure_is_reported_as_gpio_error() {
    let gpio = MockGpio::failing_after(0);
    let result = BitBangSpi::new(gpio, BusConfig::new(SCK, MOSI, CS, SpiMode::Mode2));
    assert!(matches!(result, Err(BusError::Gpio(MockError))));
}

#[test]
fn word_transport_sends_one_frame_per_word() {
    let gpio = MockGpio::default();
    let mut spi =
        BitBangSpi::new(gpio.clone(), BusConfig::new(SCK, MOSI, CS, SpiMode::Mode2)).expect("bus setup");
    gpio.clear();
    for word in [0x2000, 0x2100, 0x2000] {
        spi.write_word(word).expect("write_word");
    }
    let frames = gpio
        .writes()
        .iter()
        .filter(|w| **w == (CS, Level::Low))
        .count();
    assert_eq!(frames, 3);
    assert_eq!(gpio.writes().len(), 3 * (2 + 16 * 3));
}

// ============================================================================
// embedded-hal pin adapter
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Output pin that appends (name, level) to a shared log.
struct LogPin {
    name: char,
    log: Rc<RefCell<Vec<(char, bool)>>>,
    broken: bool,
}

impl embedded_hal::digital::ErrorType for LogPin {
    type Error = PinFault;
}

impl embedded_hal::digital::OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(PinFault);
        }
        self.log.borrow_mut().push((self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(PinFault);
        }
        self.log.borrow_mut().push((self.name, true));
        Ok(())
    }
}

fn log_pins(broken: bool) -> (OutputPins<LogPin, LogPin, LogPin>, Rc<RefCell<Vec<(char, bool)>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let pin = |name| LogPin {
        name,
        log: log.clone(),
        broken,
    };
    (OutputPins::new(pin('c'), pin('d'), pin('s')), log)
}

#[test]
fn output_pins_drive_a_mode0_frame() {
    let (pins, log) = log_pins(false);
    let config = OutputPins::<LogPin, LogPin, LogPin>::bus_config(SpiMode::Mode0);
    let mut spi = BitBangSpi::new(pins, config).expect("bus setup");
    log.borrow_mut().clear();

    spi.transfer(0x8000).expect("transfer");

    let log = log.borrow();
    assert_eq!(log[0], ('s', false));
    // First bit is 1: data high before the rising edge.
    assert_eq!(&log[1..4], &[('d', true), ('c', true), ('c', false)]);
    assert_eq!(&log[4..7], &[('d', false), ('c', true), ('c', false)]);
    assert_eq!(log.last(), Some(&('s', true)));
}

#[test]
fn output_pins_map_hal_errors() {
    let (mut pins, _) = log_pins(true);
    assert_eq!(
        pins.write_level(1, Level::High),
        Err(PinError::Pin(embedded_hal::digital::ErrorKind::Other))
    );
    assert_eq!(pins.configure_output(7), Err(PinError::UnknownPin(7)));
    assert_eq!(pins.write_level(3, Level::Low), Err(PinError::UnknownPin(3)));
}
