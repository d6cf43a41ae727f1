//! Blocking delay backed by the OS scheduler.

use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// `DelayNs` via `std::thread::sleep`. Sleeps at least as long as asked,
/// often longer, which the device setup times tolerate.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        if ns > 0 {
            std::thread::sleep(Duration::from_nanos(ns.into()));
        }
    }
}
