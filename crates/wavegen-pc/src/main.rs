//! PC host for the AD9833 waveform generator.
//!
//! Single-threaded. Drives the generator through a bit-banged SPI bus on a
//! GPIO bridge; the bridge is the recording [`trace::TraceGpio`], so every
//! run ends with a decode of the frames that went out on the wire.

mod delay;
mod trace;

use std::process;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use fugit::{HertzU32, MicrosDurationU32};

use wavegen_core::ad9833::registers::{
    ADDR_MASK, FREQ0_ADDR, FREQ1_ADDR, FREQ_HALF_MASK, PHASE_MASK, PHASE_SELECT,
};
use wavegen_core::ad9833::tuning;
use wavegen_core::bus::{BitBangSpi, BitOrder, BusConfig, SpiMode};
use wavegen_core::{Ad9833, Ad9833Config, Control, Timing, Waveform};

use delay::StdDelay;
use trace::TraceGpio;

#[derive(Parser)]
#[command(name = "wavegen-pc")]
#[command(about = "Program an AD9833 waveform generator over bit-banged GPIO", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Master clock frequency in Hz
    #[arg(long, global = true, default_value_t = 25_000_000)]
    mclk: u32,

    /// SPI mode (0-3); the AD9833 samples on the falling edge with SCLK idle high
    #[arg(long, global = true, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=3))]
    spi_mode: u8,

    /// Send the least significant bit first
    #[arg(long, global = true)]
    lsb_first: bool,

    /// Clock line
    #[arg(long, global = true, default_value_t = 3)]
    sck: u8,

    /// Data line
    #[arg(long, global = true, default_value_t = 5)]
    mosi: u8,

    /// Chip select (FSYNC) line
    #[arg(long, global = true, default_value_t = 0)]
    cs: u8,

    /// Minimum pause after each word, in microseconds
    #[arg(long, global = true, default_value_t = 10)]
    word_gap_us: u32,

    /// Reset hold time, in microseconds
    #[arg(long, global = true, default_value_t = 10_000)]
    settle_us: u32,

    /// Make the GPIO bridge fail after this many writes
    #[arg(long, global = true)]
    fail_after: Option<usize>,

    /// Suppress log output (only show results and errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise the device and program one output
    Apply {
        /// Output frequency in Hz
        #[arg(short, long, default_value_t = 1000.0)]
        freq: f64,

        /// Frequency/phase register bank (0 or 1)
        #[arg(short, long, default_value_t = 0)]
        channel: u8,

        /// SINE, TRIANGLE, SQUARE1, SQUARE2, OFF (or SIN, TRI, SQ1, SQ2)
        #[arg(short, long, default_value = "sine")]
        waveform: Waveform,

        /// Phase offset in degrees
        #[arg(short, long)]
        phase: Option<f64>,

        /// Switch the output off again before exiting
        #[arg(long)]
        off_on_exit: bool,
    },
    /// Initialise the device (28-bit mode + reset) only
    Reset,
    /// Clock out one raw word and draw its timing diagram
    Trace {
        /// Word to send, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_word)]
        word: u16,
    },
}

fn parse_word(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid 16-bit word '{s}': {e}"))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging (suppressed if --quiet)
    if !cli.quiet {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mode = SpiMode::try_from(cli.spi_mode).map_err(|m| anyhow!("invalid SPI mode {m}"))?;
    let mut bus = BusConfig::new(cli.sck, cli.mosi, cli.cs, mode);
    if cli.lsb_first {
        bus = bus.with_bit_order(BitOrder::LsbFirst);
    }

    let mut gpio = TraceGpio::new();
    if let Some(writes) = cli.fail_after {
        gpio = gpio.fail_after(writes);
    }
    let spi = BitBangSpi::new(gpio, bus).context("bus setup failed")?;

    let config = Ad9833Config {
        mclk: HertzU32::from_raw(cli.mclk),
        timing: Timing {
            word_gap: MicrosDurationU32::from_ticks(cli.word_gap_us),
            reset_settle: MicrosDurationU32::from_ticks(cli.settle_us),
        },
    };

    let gpio = match &cli.command {
        Commands::Trace { word } => {
            let mut spi = spi;
            spi.transfer(*word).context("transfer failed")?;
            let gpio = spi.release();
            let diagram = trace::render_frame(gpio.events(), &bus)
                .ok_or_else(|| anyhow!("no complete frame recorded"))?;
            println!("{diagram}");
            gpio
        }
        Commands::Reset => {
            let mut dds = Ad9833::new(spi, StdDelay, config);
            dds.begin()?;
            dds.release().0.release()
        }
        Commands::Apply {
            freq,
            channel,
            waveform,
            phase,
            off_on_exit,
        } => {
            let mut dds = Ad9833::new(spi, StdDelay, config);
            dds.begin()?;
            dds.set_frequency(*channel, *freq)?;
            if let Some(degrees) = phase {
                dds.set_phase(*channel, *degrees)?;
                dds.set_active_phase(*channel)?;
            }
            dds.set_active_frequency(*channel)?;
            dds.set_mode(*waveform)?;
            log::info!("output: {freq} Hz {waveform} on channel {channel}");
            if *off_on_exit {
                dds.shutdown()?;
            }
            dds.release().0.release()
        }
    };

    print_frames(&trace::decode_frames(gpio.events(), &bus), cli.mclk);
    Ok(())
}

/// Print each decoded bus word with its register meaning.
fn print_frames(words: &[u16], mclk_hz: u32) {
    println!("{} frame(s):", words.len());
    let mut pending_lsb = None;
    for (i, &word) in words.iter().enumerate() {
        println!("  {i:>3}  0x{word:04X}  {}", describe(word));
        let addr = word & ADDR_MASK;
        if addr == FREQ0_ADDR || addr == FREQ1_ADDR {
            match pending_lsb.take() {
                None => pending_lsb = Some(word),
                Some(lsb) => {
                    let tuning_word = tuning::join_tuning_word(lsb, word);
                    println!(
                        "            -> tuning word {tuning_word} = {:.3} Hz",
                        tuning::output_frequency(tuning_word, mclk_hz)
                    );
                }
            }
        }
    }
}

fn describe(word: u16) -> String {
    match word & ADDR_MASK {
        0 => format!("{:?}", Control::from_bits_retain(word)),
        FREQ0_ADDR => format!("FREQ0 half 0x{:04X}", word & FREQ_HALF_MASK),
        FREQ1_ADDR => format!("FREQ1 half 0x{:04X}", word & FREQ_HALF_MASK),
        _ => {
            let reg = if word & PHASE_SELECT == 0 { 0 } else { 1 };
            format!("PHASE{reg} 0x{:03X}", word & PHASE_MASK)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_words() {
        assert_eq!(parse_word("0x2100"), Ok(0x2100));
        assert_eq!(parse_word("0XFFFF"), Ok(0xFFFF));
        assert_eq!(parse_word("8192"), Ok(0x2000));
        assert!(parse_word("0x10000").is_err());
        assert!(parse_word("sine").is_err());
    }

    #[test]
    fn describes_each_register() {
        assert_eq!(describe(0x2100), "Control(B28 | RESET)");
        assert_eq!(describe(0x4000 | 0x29F1), "FREQ0 half 0x29F1");
        assert_eq!(describe(0x8000), "FREQ1 half 0x0000");
        assert_eq!(describe(0xE400), "PHASE1 0x400");
    }

    #[test]
    fn cli_defaults_match_the_device() {
        let cli = Cli::try_parse_from(["wavegen-pc", "apply"]).unwrap();
        assert_eq!(cli.spi_mode, 2);
        assert_eq!(cli.mclk, 25_000_000);
        match cli.command {
            Commands::Apply { freq, channel, waveform, .. } => {
                assert_eq!(freq, 1000.0);
                assert_eq!(channel, 0);
                assert_eq!(waveform, Waveform::Sine);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn cli_rejects_unknown_waveform_and_mode() {
        assert!(Cli::try_parse_from(["wavegen-pc", "apply", "-w", "saw"]).is_err());
        assert!(Cli::try_parse_from(["wavegen-pc", "--spi-mode", "4", "reset"]).is_err());
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["wavegen-pc", "--word-gap-us", "0", "--settle-us", "0", "-q"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn apply_runs_end_to_end() {
        assert!(run(&cli(&["apply", "-f", "440", "-w", "tri", "-p", "90"])).is_ok());
    }

    #[test]
    fn apply_reports_invalid_channel() {
        let err = run(&cli(&["apply", "-c", "2"])).unwrap_err();
        assert!(err.to_string().contains("invalid channel 2"), "{err}");
    }

    #[test]
    fn gpio_fault_surfaces_as_error() {
        let err = run(&cli(&["--fail-after", "20", "reset"])).unwrap_err();
        assert!(format!("{err:#}").contains("transport error: Injected(20)"), "{err:#}");
    }

    #[test]
    fn conflicting_pins_are_rejected() {
        let err = run(&cli(&["--sck", "0", "reset"])).unwrap_err();
        assert!(format!("{err:#}").contains("more than one bus line"), "{err:#}");
    }
}
