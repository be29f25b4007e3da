// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HAL for Cortex-M4 microcontrollers of four vendors
//!
//! This is an implementation of the [`embedded-hal`] traits for the
//! AT32F435/437, GD32F4xx, HC32F4A0 and STM32F4xx families, plus board
//! support for one evaluation board of each.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! Each family lives in its own module with its register overlays, a
//! `Peripherals` singleton and the drivers that are specific to it. The
//! drivers that every family shares (serial, SPI, watchdogs, CRC, RNG, EXTI,
//! delay) are generic over a small register access trait per peripheral.
//!
//! ## Commonly used setup
//!
//! Almost all peripherals need a clock bus token from the clock controller.
//! The following code shows how to bring up the clock tree:
//!
//! ```rust,ignore
//! use m4_hal::prelude::*;
//! use m4_hal::stm32f4;
//!
//! let dp = stm32f4::Peripherals::take().unwrap();
//! let mut rcc = dp.RCC.constrain();
//!
//! // Freeze the configuration of all the clocks in the system and store the
//! // frozen frequencies in `clocks`
//! let clocks = rcc.cfgr.use_hse(8.mhz()).sysclk(168.mhz()).freeze(&dp.FLASH)?;
//! let gpiod = dp.GPIOD.split(&mut rcc.ahb1);
//! ```
//!
//! Or let the board module do all of it, including the `println!` console:
//!
//! ```rust,ignore
//! let board = m4_hal::stm32f4::board::init(dp, cp.SYST)?;
//! m4_hal::println!("running at {} Hz", board.clocks.sysclk().0);
//! ```
//!
//! ## Usage examples
//!
//! See the `demos` folder.

#![cfg_attr(not(test), no_std)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bsp;
pub mod can;
pub mod clocks;
pub mod crc;
pub mod delay;
pub mod exti;
#[cfg(feature = "fault-traps")]
pub mod fault;
pub mod gpio;
pub mod nvic;
pub mod prelude;
pub mod reg;
pub mod rng;
pub mod serial;
pub mod spi;
pub mod time;
pub mod timer;
pub mod watchdog;

pub mod at32f435;
pub mod gd32f4;
pub mod hc32f4a0;
pub mod stm32f4;
