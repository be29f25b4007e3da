// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blinks the four LEDs of the STM32F4-Discovery in turn, using the board
//! module and the SysTick delay

#![deny(unsafe_code)]
#![no_std]
#![no_main]

use panic_halt as _;

use cortex_m_rt::entry;
use m4_hal::prelude::*;
use m4_hal::stm32f4::{self, board};

#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = stm32f4::Peripherals::take().unwrap();

    let board::Board {
        mut delay,
        mut leds,
        ..
    } = board::init(dp, cp.SYST).unwrap();
    m4_hal::println!("{} at {} Hz", board::INFO.name, board::INFO.sysclk.0);

    loop {
        leds.green.toggle();
        delay.delay_ms(100u32);
        leds.orange.toggle();
        delay.delay_ms(100u32);
        leds.red.toggle();
        delay.delay_ms(100u32);
        leds.blue.toggle();
        delay.delay_ms(100u32);
    }
}
