// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feeds the independent watchdog while the user button is released
//!
//! Holding the button for a second lets the watchdog reset the chip, and
//! the interval is printed again over semihosting on the way back up.

#![deny(unsafe_code)]
#![no_std]
#![no_main]

use panic_semihosting as _;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use m4_hal::delay::Delay;
use m4_hal::prelude::*;
use m4_hal::stm32f4;
use m4_hal::time::MilliSeconds;
use m4_hal::watchdog::IndependentWatchdog;

#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = stm32f4::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(8.mhz())
        .sysclk(168.mhz())
        .freeze(&dp.FLASH)
        .unwrap();
    let mut delay = Delay::new(cp.SYST, clocks);

    let gpioa = dp.GPIOA.split(&mut rcc.ahb1);
    let button = gpioa.pa0;

    let mut watchdog = IndependentWatchdog::new(dp.IWDG);
    watchdog.start(MilliSeconds(1_000));
    hprintln!("watchdog interval {} ms", watchdog.interval().0);

    loop {
        if button.is_low() {
            watchdog.feed();
        }
        delay.delay_ms(100u32);
    }
}
