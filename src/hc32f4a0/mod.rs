// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HC32F4A0
//!
//! ```rust,ignore
//! let dp = hc32f4a0::Peripherals::take().unwrap();
//! let mut cmu = dp.CMU.constrain(dp.FCG);
//! let clocks = cmu
//!     .cfgr
//!     .use_xtal(8.mhz())
//!     .sysclk(240.mhz())
//!     .freeze(&dp.EFM, &dp.SRAMC, &dp.PWC, &dp.GPIO)?;
//! let gpio = dp.GPIO.split(&mut ());
//! ```
//!
//! All ports share one register block, and every peripheral clock is
//! gated through the function clock controller (FCG) rather than per-bus
//! enable registers. Interrupt vectors are assigned at run time through
//! [`intc::Intc::route`].

pub mod board;
pub mod cmu;
pub mod crc;
pub mod gpio;
pub mod intc;
pub mod swdt;
pub mod trng;
pub mod usart;

use crate::nvic::interrupts;
use crate::reg::peripherals;

peripherals! {
    /// Clock controller
    CMU: cmu::CmuRegisters = 0x4004_C000,
    /// Function clock gates
    FCG: cmu::FcgRegisters = 0x4004_8000,
    /// Embedded flash controller
    EFM: cmu::EfmRegisters = 0x4001_0400,
    /// SRAM controller
    SRAMC: cmu::SramcRegisters = 0x4005_0800,
    /// Power controller
    PWC: cmu::PwcRegisters = 0x4004_C400,
    GPIO: gpio::GpioRegisters = 0x4005_3800,
    USART1: usart::UsartRegisters = 0x4001_CC00,
    USART2: usart::UsartRegisters = 0x4001_D000,
    USART3: usart::UsartRegisters = 0x4001_D400,
    USART4: usart::UsartRegisters = 0x4001_D800,
    USART5: usart::UsartRegisters = 0x4001_DC00,
    USART6: usart::UsartRegisters = 0x4002_0C00,
    USART7: usart::UsartRegisters = 0x4002_1000,
    USART8: usart::UsartRegisters = 0x4002_1400,
    /// Special watchdog timer
    SWDT: swdt::SwdtRegisters = 0x4004_9400,
    /// True random number generator
    TRNG: trng::TrngRegisters = 0x4004_2000,
    CRC: crc::CrcRegisters = 0x4000_8C00,
    /// Interrupt controller
    INTC: intc::IntcRegisters = 0x4005_1000,
}

interrupts! {
    /// Vector slots that accept any event source
    chip: "hc32f4a0",
    vectors: 144,
    lines: {
        IRQ000 = 0,
        IRQ001 = 1,
        IRQ002 = 2,
        IRQ003 = 3,
        IRQ004 = 4,
        IRQ005 = 5,
        IRQ006 = 6,
        IRQ007 = 7,
        IRQ008 = 8,
        IRQ009 = 9,
        IRQ010 = 10,
        IRQ011 = 11,
        IRQ012 = 12,
        IRQ013 = 13,
        IRQ014 = 14,
        IRQ015 = 15,
        IRQ016 = 16,
        IRQ017 = 17,
        IRQ018 = 18,
        IRQ019 = 19,
        IRQ020 = 20,
        IRQ021 = 21,
        IRQ022 = 22,
        IRQ023 = 23,
        IRQ024 = 24,
        IRQ025 = 25,
        IRQ026 = 26,
        IRQ027 = 27,
        IRQ028 = 28,
        IRQ029 = 29,
        IRQ030 = 30,
        IRQ031 = 31,
    }
}
