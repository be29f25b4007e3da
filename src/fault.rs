// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exception traps
//!
//! Every fault parks the core in a loop so a debugger can inspect the
//! stacked frame. Enabled by the `fault-traps` feature; applications that
//! install their own handlers leave it off.
//!
//! A device interrupt that fires without a handler is masked again and
//! the core carries on.

use crate::nvic::device_line;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::{exception, ExceptionFrame};

#[exception]
unsafe fn HardFault(_frame: &ExceptionFrame) -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[exception]
fn MemoryManagement() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[exception]
fn BusFault() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[exception]
fn UsageFault() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    match device_line(irqn) {
        Some(line) => NVIC::mask(line),
        None => loop {
            cortex_m::asm::nop();
        },
    }
}

