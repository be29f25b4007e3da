// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Walks a light across the three LEDs of the AT-START-F435
//!
//! The user button reverses the direction.

#![deny(unsafe_code)]
#![no_std]
#![no_main]

use panic_halt as _;

use cortex_m_rt::entry;
use m4_hal::at32f435::{self, board};
use m4_hal::bsp::Led;
use m4_hal::prelude::*;

#[entry]
fn main() -> ! {
    // Get access to the core peripherals from the cortex-m crate
    let cp = cortex_m::Peripherals::take().unwrap();
    // Get access to the device specific peripherals
    let dp = at32f435::Peripherals::take().unwrap();

    // 288 MHz from the 8 MHz crystal, LEDs off, console on USART1
    let board::Board {
        mut delay,
        leds,
        button,
        ..
    } = board::init(dp, cp.SYST).unwrap();
    // same port, so the erased pins share one type
    let polarity = board::INFO.led_polarity;
    let mut leds = [
        Led::new(leds.red.free().erase(), polarity),
        Led::new(leds.yellow.free().erase(), polarity),
        Led::new(leds.green.free().erase(), polarity),
    ];

    m4_hal::println!("{} blinky", board::INFO.name);

    let mut lit = 0usize;
    loop {
        leds[lit].off();
        lit = if button.is_pressed().unwrap_or(false) {
            (lit + leds.len() - 1) % leds.len()
        } else {
            (lit + 1) % leds.len()
        };
        leds[lit].on();
        delay.delay_ms(250u32);
    }
}
