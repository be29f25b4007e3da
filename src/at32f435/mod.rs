// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # AT32F435/437
//!
//! ```rust,ignore
//! let dp = at32f435::Peripherals::take().unwrap();
//! let mut crm = dp.CRM.constrain();
//! let clocks = crm
//!     .cfgr
//!     .use_hext(8.mhz())
//!     .sysclk(288.mhz())
//!     .freeze(&dp.FLASH, &dp.PWC)?;
//! let gpiod = dp.GPIOD.split(&mut crm.ahb1);
//! ```
//!
//! The external interrupt controller is called EXINT and its line
//! multiplexer sits in SCFG; both plug into [`crate::exti`].

pub mod board;
pub mod crc;
pub mod crm;
pub mod exint;
pub mod gpio;
pub mod spi;
pub mod usart;
pub mod wdt;

use crate::nvic::interrupts;
use crate::reg::peripherals;

peripherals! {
    /// Clock and reset manager
    CRM: crm::CrmRegisters = 0x4002_3800,
    /// Flash controller
    FLASH: crm::FlashRegisters = 0x4002_3C00,
    /// Power controller
    PWC: crm::PwcRegisters = 0x4000_7000,
    GPIOA: gpio::GpioRegisters = 0x4002_0000,
    GPIOB: gpio::GpioRegisters = 0x4002_0400,
    GPIOC: gpio::GpioRegisters = 0x4002_0800,
    GPIOD: gpio::GpioRegisters = 0x4002_0C00,
    GPIOE: gpio::GpioRegisters = 0x4002_1000,
    GPIOF: gpio::GpioRegisters = 0x4002_1400,
    GPIOG: gpio::GpioRegisters = 0x4002_1800,
    GPIOH: gpio::GpioRegisters = 0x4002_1C00,
    USART1: usart::UsartRegisters = 0x4001_1000,
    USART2: usart::UsartRegisters = 0x4000_4400,
    USART3: usart::UsartRegisters = 0x4000_4800,
    UART4: usart::UsartRegisters = 0x4000_4C00,
    UART5: usart::UsartRegisters = 0x4000_5000,
    USART6: usart::UsartRegisters = 0x4001_1400,
    SPI1: spi::SpiRegisters = 0x4001_3000,
    SPI2: spi::SpiRegisters = 0x4000_3800,
    SPI3: spi::SpiRegisters = 0x4000_3C00,
    /// Watchdog timer
    WDT: wdt::WdtRegisters = 0x4000_3000,
    /// Window watchdog timer
    WWDT: wdt::WwdtRegisters = 0x4000_2C00,
    CRC: crc::CrcRegisters = 0x4002_3000,
    /// External interrupt controller
    EXINT: exint::ExintRegisters = 0x4001_3C00,
    /// System configuration controller
    SCFG: exint::ScfgRegisters = 0x4001_3800,
}

interrupts! {
    /// Interrupt lines of the peripherals driven by this crate
    chip: "at32f435",
    vectors: 112,
    lines: {
        WWDT = 0,
        EXINT0 = 6,
        EXINT1 = 7,
        EXINT2 = 8,
        EXINT3 = 9,
        EXINT4 = 10,
        EXINT9_5 = 23,
        SPI1 = 35,
        SPI2 = 36,
        USART1 = 37,
        USART2 = 38,
        USART3 = 39,
        EXINT15_10 = 40,
        SPI3 = 51,
        UART4 = 52,
        UART5 = 53,
        USART6 = 71,
    }
}

#[cfg(test)]
mod tests {
    use super::Interrupt;

    #[test]
    fn vector_table_covers_every_line() {
        crate::nvic::tests::check_vectors!(Interrupt, include_str!("../../device/at32f435.x"));
        assert_eq!(Interrupt::EXINT15_10.handler(), "EXINT15_10");
    }
}
