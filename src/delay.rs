// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delays

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::clocks::Clocks;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

/// The SysTick reload value register is 24 bits wide
const MAX_RVR: u32 = 0x00FF_FFFF;

/// System timer (SysTick) as a delay provider
pub struct Delay {
    clocks: Clocks,
    syst: SYST,
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider
    pub fn new(mut syst: SYST, clocks: Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);

        Delay { syst, clocks }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }

    fn spin(&mut self, ticks: u64) {
        for rvr in Chunks::new(ticks) {
            self.syst.set_reload(rvr);
            self.syst.clear_current();
            self.syst.enable_counter();

            while !self.syst.has_wrapped() {}

            self.syst.disable_counter();
        }
    }
}

/// Number of core clock ticks in `us` microseconds
pub(crate) fn ticks_us(hclk: u32, us: u32) -> u64 {
    u64::from(us) * u64::from(hclk) / 1_000_000
}

/// Number of core clock ticks in `ms` milliseconds
pub(crate) fn ticks_ms(hclk: u32, ms: u32) -> u64 {
    u64::from(ms) * u64::from(hclk) / 1_000
}

/// Splits a tick count into SysTick reload values
///
/// A reload value of `n` wraps after `n + 1` ticks. A final single tick
/// is dropped, since a reload value of 0 never wraps.
#[derive(Debug)]
pub(crate) struct Chunks {
    remaining: u64,
}

impl Chunks {
    pub(crate) fn new(ticks: u64) -> Self {
        Self { remaining: ticks }
    }
}

impl Iterator for Chunks {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining < 2 {
            return None;
        }
        let period = self.remaining.min(u64::from(MAX_RVR) + 1);
        self.remaining -= period;
        Some((period - 1) as u32)
    }
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        let ticks = ticks_ms(self.clocks.hclk().0, ms);
        self.spin(ticks);
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.delay_ms(u32::from(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(u32::from(ms));
    }
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        let ticks = ticks_us(self.clocks.hclk().0, us);
        self.spin(ticks);
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(u32::from(us))
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(u32::from(us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts() {
        assert_eq!(ticks_us(168_000_000, 1), 168);
        assert_eq!(ticks_ms(288_000_000, 1), 288_000);
        // 49 days of milliseconds at 288 MHz still fit
        assert_eq!(ticks_ms(288_000_000, u32::MAX), 288_000 * u64::from(u32::MAX));
    }

    #[test]
    fn chunks_cover_the_whole_delay() {
        let ticks = ticks_ms(200_000_000, 1_000);
        let reloads: Vec<u32> = Chunks::new(ticks).collect();
        assert!(reloads.iter().all(|&r| r > 0 && r <= MAX_RVR));
        // each reload value wraps after one more tick
        assert_eq!(reloads.iter().map(|&r| u64::from(r) + 1).sum::<u64>(), ticks);
        assert_eq!(reloads.len(), 12);
        assert_eq!(reloads[0], MAX_RVR);
        assert_eq!(*reloads.last().unwrap(), 200_000_000 - 11 * (MAX_RVR + 1) - 1);
    }

    #[test]
    fn short_and_empty_delays() {
        // 1 us at 168 MHz
        assert_eq!(Chunks::new(168).collect::<Vec<_>>(), vec![167]);
        assert_eq!(Chunks::new(MAX_RVR as u64 + 1).collect::<Vec<_>>(), vec![MAX_RVR]);
        assert_eq!(Chunks::new(MAX_RVR as u64 + 3).collect::<Vec<_>>(), vec![MAX_RVR, 1]);
        assert_eq!(Chunks::new(1).count(), 0);
        assert_eq!(Chunks::new(0).count(), 0);
    }
}
