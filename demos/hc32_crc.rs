// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checksums a block of words with the HC32F4A0 CRC unit
//!
//! The result is printed over semihosting, so run this under a debugger.

#![no_std]
#![no_main]

use panic_semihosting as _;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use m4_hal::crc::Crc;
use m4_hal::hc32f4a0::{self, crc::Width};
use m4_hal::prelude::*;

const WORDS: [u32; 4] = [0x0000_0000, 0x1234_5678, 0xDEAD_BEEF, 0xFFFF_FFFF];

#[entry]
fn main() -> ! {
    let dp = hc32f4a0::Peripherals::take().unwrap();

    let mut cmu = dp.CMU.constrain(dp.FCG);
    let clocks = cmu
        .cfgr
        .use_xtal(8.mhz())
        .sysclk(240.mhz())
        .freeze(&dp.EFM, &dp.SRAMC, &dp.PWC, &dp.GPIO)
        .unwrap();
    hprintln!("sysclk {} Hz", clocks.sysclk().0);

    let mut crc = Crc::new(dp.CRC, &mut cmu.fcg0);
    crc.set_width(Width::Crc32);
    let sum = crc.checksum(&WORDS);
    hprintln!("crc32 {:#010x}", sum);
    hprintln!("check {}", crc.check(&WORDS, sum));

    crc.set_width(Width::Crc16);
    hprintln!("crc16 {:#06x}", crc.checksum(&WORDS));

    loop {
        cortex_m::asm::wfi();
    }
}
