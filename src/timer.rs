// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SysTick count-down timer

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::timer::{CountDown, Periodic};
use void::Void;

use crate::clocks::Clocks;
use crate::time::Hertz;

/// Interrupt events
pub enum Event {
    /// Timer timed out / count down ended
    Update,
}

/// Hardware timer
pub struct Timer {
    syst: SYST,
    clk: Hertz,
}

/// Timer that counts down periods of a given frequency
pub struct CountDownTimer {
    syst: SYST,
    clk: Hertz,
}

impl Timer {
    /// Initialize the SysTick as a timer running at the core clock
    pub fn syst(mut syst: SYST, clocks: &Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);
        Self {
            syst,
            clk: clocks.hclk(),
        }
    }

    /// Starts a count down timer at the given frequency
    pub fn start_count_down<T>(self, timeout: T) -> CountDownTimer
    where
        T: Into<Hertz>,
    {
        let Self { syst, clk } = self;
        let mut timer = CountDownTimer { syst, clk };
        timer.start(timeout);
        timer
    }

    /// Releases the SysTick
    pub fn release(self) -> SYST {
        self.syst
    }
}

/// Reload value giving one wrap per period of `freq`, if it fits in 24 bits
pub(crate) fn reload_for(clk: Hertz, freq: Hertz) -> Option<u32> {
    if freq.0 == 0 {
        return None;
    }
    let rvr = (clk.0 / freq.0).checked_sub(1)?;
    (rvr > 0 && rvr < (1 << 24)).then_some(rvr)
}

impl CountDownTimer {
    /// Starts listening for an `event`
    pub fn listen(&mut self, event: Event) {
        match event {
            Event::Update => self.syst.enable_interrupt(),
        }
    }

    /// Stops listening for an `event`
    pub fn unlisten(&mut self, event: Event) {
        match event {
            Event::Update => self.syst.disable_interrupt(),
        }
    }

    /// Returns the number of microseconds since the last update event
    pub fn micros_since(&self) -> u32 {
        let reload_value = SYST::get_reload();
        let ticks_per_us = (self.clk.0 / 1_000_000).max(1);
        (reload_value - SYST::get_current()) / ticks_per_us
    }

    /// Stops the timer
    pub fn stop(mut self) -> Timer {
        self.syst.disable_counter();
        let Self { syst, clk } = self;
        Timer { syst, clk }
    }
}

impl CountDown for CountDownTimer {
    type Time = Hertz;

    fn start<T>(&mut self, timeout: T)
    where
        T: Into<Hertz>,
    {
        let rvr = match reload_for(self.clk, timeout.into()) {
            Some(rvr) => rvr,
            None => panic!("SysTick period out of range"),
        };

        self.syst.set_reload(rvr);
        self.syst.clear_current();
        self.syst.enable_counter();
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.syst.has_wrapped() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl Periodic for CountDownTimer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_values() {
        assert_eq!(reload_for(Hertz(168_000_000), Hertz(1_000)), Some(167_999));
        assert_eq!(reload_for(Hertz(8_000_000), Hertz(1)), Some(7_999_999));
        // one second at 168 MHz does not fit in 24 bits
        assert_eq!(reload_for(Hertz(168_000_000), Hertz(1)), None);
        assert_eq!(reload_for(Hertz(1_000), Hertz(2_000)), None);
        assert_eq!(reload_for(Hertz(1_000), Hertz(0)), None);
    }
}
