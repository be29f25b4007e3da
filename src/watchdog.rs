// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watchdog peripherals
//!
//! [`IndependentWatchdog`] runs from the low speed internal oscillator and
//! keeps counting when the core clock fails. [`WindowWatchdog`] runs from
//! PCLK1 and also resets the device when it is fed too early.

use embedded_hal::watchdog::{Watchdog, WatchdogEnable};

use crate::clocks::{BusClock, Clocks, Enable};
use crate::reg::{wait_for, Peripheral, Timeout};
use crate::time::{Hertz, MicroSeconds, MilliSeconds};

/// Key that makes the prescaler and reload registers writable
pub const KEY_UNLOCK: u16 = 0x5555;
/// Key that reloads the counter
pub const KEY_FEED: u16 = 0xAAAA;
/// Key that starts the watchdog
pub const KEY_START: u16 = 0xCCCC;

const MAX_PR: u8 = 0b110;
const MAX_RL: u16 = 0x0FFF;

/// Polls of the update flags before giving up
const UPDATE_BUDGET: u32 = 100_000;

/// Register access to an independent watchdog, implemented by each family
pub trait IwdgRegisters {
    /// Frequency of the oscillator clocking the watchdog
    const LSI: Hertz;

    /// Writes a key to the key register
    fn key(&self, key: u16);

    /// Writes the prescaler and reload registers
    fn set_timing(&self, pr: u8, rl: u16);

    /// Reads back the prescaler and reload registers
    fn timing(&self) -> (u8, u16);

    /// Returns true while a prescaler or reload update is in progress
    fn updating(&self) -> bool;
}

/// Prescaler bits and reload value for a timeout of `ms` against `lsi`
///
/// The shortest prescaler that fits is used, for the finest resolution.
/// Timeouts beyond the range saturate at the longest one.
pub fn iwdg_timing(lsi: Hertz, ms: u32) -> (u8, u16) {
    for pr in 0..=MAX_PR {
        let div = 4u64 << pr;
        let ticks = (u64::from(ms) * u64::from(lsi.0) + div * 1000 - 1) / (div * 1000);
        if ticks <= u64::from(MAX_RL) + 1 {
            let rl = cast::u16(ticks.saturating_sub(1)).unwrap_or(MAX_RL);
            return (pr, rl);
        }
    }
    (MAX_PR, MAX_RL)
}

/// Timeout in milliseconds of a prescaler/reload pair
pub fn iwdg_timeout_ms(lsi: Hertz, pr: u8, rl: u16) -> u32 {
    let div = 4u64 << pr.min(MAX_PR);
    cast::u32((u64::from(rl) + 1) * div * 1000 / u64::from(lsi.0)).unwrap_or(u32::MAX)
}

/// Wraps the independent watchdog
pub struct IndependentWatchdog<WDG> {
    wdg: WDG,
}

impl<WDG> IndependentWatchdog<WDG>
where
    WDG: Peripheral,
    WDG::Registers: IwdgRegisters,
{
    /// Wraps the watchdog peripheral
    pub fn new(wdg: WDG) -> Self {
        IndependentWatchdog { wdg }
    }

    /// Starts the watchdog with a `period`, reporting a stuck update
    pub fn try_start(&mut self, period: MilliSeconds) -> Result<(), Timeout> {
        let (pr, rl) = iwdg_timing(<WDG::Registers as IwdgRegisters>::LSI, period.0);
        let regs = self.wdg.registers();

        regs.key(KEY_START);
        regs.key(KEY_UNLOCK);
        regs.set_timing(pr, rl);
        let updated = wait_for(UPDATE_BUDGET, || !regs.updating());
        regs.key(KEY_FEED);
        updated
    }

    /// Returns the configured timeout in milliseconds
    pub fn interval(&self) -> MilliSeconds {
        let (pr, rl) = self.wdg.registers().timing();
        MilliSeconds(iwdg_timeout_ms(<WDG::Registers as IwdgRegisters>::LSI, pr, rl))
    }

    /// Returns the watchdog token
    ///
    /// The watchdog keeps running once started.
    pub fn free(self) -> WDG {
        self.wdg
    }
}

impl<WDG> WatchdogEnable for IndependentWatchdog<WDG>
where
    WDG: Peripheral,
    WDG::Registers: IwdgRegisters,
{
    type Time = MilliSeconds;

    fn start<T: Into<Self::Time>>(&mut self, period: T) {
        // the reload value is applied by the next feed either way
        self.try_start(period.into()).ok();
    }
}

impl<WDG> Watchdog for IndependentWatchdog<WDG>
where
    WDG: Peripheral,
    WDG::Registers: IwdgRegisters,
{
    fn feed(&mut self) {
        self.wdg.registers().key(KEY_FEED);
    }
}

/// Counter values at and below which the window watchdog resets
pub const WWDG_RESET: u8 = 0x3F;

/// Register access to a window watchdog, implemented by each family
pub trait WwdgRegisters {
    /// Writes prescaler bits and the window value
    fn configure(&self, psc: u8, window: u8);

    /// Writes the 7-bit counter, starting the watchdog
    fn set_counter(&self, counter: u8);

    /// Reads the 7-bit counter
    fn counter(&self) -> u8;

    /// Enables the early wakeup interrupt
    fn enable_early_wakeup(&self);

    /// Returns and clears the early wakeup flag
    fn take_early_wakeup(&self) -> bool;
}

/// Prescaler bits and counter value for a window watchdog timeout of `us`
///
/// The counter starts at `0x40 | t` and resets the device when it counts
/// down past `0x40`, after `4096 * 2^psc * (t + 1)` PCLK1 cycles. Timeouts
/// shorter than one tick get the shortest one; `None` means `us` is beyond
/// the longest.
pub fn wwdg_timing(pclk1: Hertz, us: u32) -> Option<(u8, u8)> {
    for psc in 0..4u8 {
        let tick_cycles = 4096u64 << psc;
        let cycles = u64::from(us) * u64::from(pclk1.0);
        let ticks = (cycles + tick_cycles * 1_000_000 - 1) / (tick_cycles * 1_000_000);
        if ticks <= 64 {
            return Some((psc, 0x40 | ticks.saturating_sub(1) as u8));
        }
    }
    None
}

/// Timeout in microseconds of a window watchdog counter value
pub fn wwdg_timeout_us(pclk1: Hertz, psc: u8, counter: u8) -> u32 {
    let ticks = u64::from(counter & 0x3F) + 1;
    let cycles = (4096u64 << psc.min(3)) * ticks;
    cast::u32(cycles * 1_000_000 / u64::from(pclk1.0)).unwrap_or(u32::MAX)
}

/// Wraps the window watchdog
pub struct WindowWatchdog<WDG> {
    wdg: WDG,
    pclk1: Hertz,
    counter: u8,
    window: u8,
}

impl<WDG> WindowWatchdog<WDG>
where
    WDG: Peripheral + Enable,
    WDG::Registers: WwdgRegisters,
    WDG::Bus: BusClock,
{
    /// Enables the watchdog clock
    pub fn new(wdg: WDG, clocks: &Clocks, bus: &mut WDG::Bus) -> Self {
        WDG::enable(bus);
        WindowWatchdog {
            wdg,
            pclk1: <WDG::Bus as BusClock>::clock(clocks),
            counter: 0x7F,
            window: 0x7F,
        }
    }

    /// Restricts feeding to when the counter is below `window`
    ///
    /// Takes effect at the next `start`.
    pub fn set_window(&mut self, window: u8) {
        self.window = window & 0x7F;
    }

    /// Enables the early wakeup interrupt, raised when the counter hits `0x40`
    pub fn listen(&mut self) {
        self.wdg.registers().enable_early_wakeup();
    }

    /// Returns and clears the early wakeup flag
    pub fn is_early_wakeup(&mut self) -> bool {
        self.wdg.registers().take_early_wakeup()
    }
}

impl<WDG> WatchdogEnable for WindowWatchdog<WDG>
where
    WDG: Peripheral + Enable,
    WDG::Registers: WwdgRegisters,
    WDG::Bus: BusClock,
{
    type Time = MicroSeconds;

    /// Starts the watchdog; timeouts beyond the range saturate at the longest
    fn start<T: Into<Self::Time>>(&mut self, period: T) {
        let (psc, counter) = wwdg_timing(self.pclk1, period.into().0).unwrap_or((3, 0x7F));
        self.counter = counter;
        let regs = self.wdg.registers();
        regs.configure(psc, self.window);
        regs.set_counter(counter);
    }
}

impl<WDG> Watchdog for WindowWatchdog<WDG>
where
    WDG: Peripheral + Enable,
    WDG::Registers: WwdgRegisters,
{
    fn feed(&mut self) {
        self.wdg.registers().set_counter(self.counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_timing_covers_the_timeout() {
        // 32 kHz: /4 would need 8000 ticks, /8 gives 4000
        assert_eq!(iwdg_timing(Hertz(32_000), 1_000), (1, 3_999));
        // 40 kHz LICK: /16 gives 2500
        assert_eq!(iwdg_timing(Hertz(40_000), 1_000), (2, 2_499));
        assert_eq!(iwdg_timing(Hertz(32_000), 0), (0, 0));
        // saturates
        assert_eq!(iwdg_timing(Hertz(32_000), 100_000), (6, 0x0FFF));
        for ms in [1, 10, 250, 1_000, 20_000] {
            let (pr, rl) = iwdg_timing(Hertz(32_000), ms);
            assert!(iwdg_timeout_ms(Hertz(32_000), pr, rl) >= ms);
        }
    }

    #[test]
    fn window_timing_inverts_the_timeout_formula() {
        // 42 MHz: one tick at /8 is 780 us, 40 ms needs 52 of them
        assert_eq!(wwdg_timing(Hertz(42_000_000), 40_000), Some((3, 0x40 | 51)));
        assert_eq!(wwdg_timing(Hertz(42_000_000), 50_000), None);
        // shorter than one tick at /1 (97 us)
        assert_eq!(wwdg_timing(Hertz(42_000_000), 0), Some((0, 0x40)));
        assert_eq!(wwdg_timing(Hertz(42_000_000), 10), Some((0, 0x40)));
        let (psc, counter) = wwdg_timing(Hertz(42_000_000), 5_000).unwrap();
        assert_eq!(psc, 0);
        let timeout = wwdg_timeout_us(Hertz(42_000_000), psc, counter);
        assert!(timeout >= 5_000 && timeout < 5_100);
    }
}
