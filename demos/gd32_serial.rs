// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echoes everything received on USART0 of the GD32450I-EVAL
//!
//! PA9 is TX and PA10 is RX, alternate function 7. Line errors are counted
//! and reported on the next newline.

#![deny(unsafe_code)]
#![no_std]
#![no_main]

use panic_halt as _;

use core::fmt::Write as _;

use cortex_m_rt::entry;
use m4_hal::gd32f4::{self, rcu::CK_APB2_MAX};
use m4_hal::prelude::*;
use m4_hal::serial::{Config, Serial};
use m4_hal::time::Hertz;
use nb::block;

#[entry]
fn main() -> ! {
    let dp = gd32f4::Peripherals::take().unwrap();

    let mut rcu = dp.RCU.constrain();
    // 200 MHz from the 25 MHz crystal, APB2 at its 100 MHz limit
    let clocks = rcu
        .cfgr
        .use_hxtal(25.mhz())
        .sysclk(200.mhz())
        .pclk2(Hertz(CK_APB2_MAX))
        .freeze(&dp.FMC, &dp.PMU)
        .unwrap();

    let gpioa = dp.GPIOA.split(&mut rcu.ahb1);
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();

    let serial = Serial::new(
        dp.USART0,
        (tx, rx),
        Config::default().baudrate(115_200.bps()),
        &clocks,
        &mut rcu.apb2,
    )
    .unwrap();
    let (mut tx, mut rx) = serial.split();

    writeln!(tx, "echo at {} Hz", clocks.sysclk().0).ok();

    let mut errors = 0u32;
    loop {
        match block!(rx.read()) {
            Ok(byte) => {
                block!(tx.write(byte)).ok();
                if byte == b'\r' && errors != 0 {
                    writeln!(tx, "\n{} line errors", errors).ok();
                    errors = 0;
                }
            }
            Err(_) => errors += 1,
        }
    }
}
