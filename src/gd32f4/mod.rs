// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # GD32F405/407/425/427/450
//!
//! ```rust,ignore
//! let dp = gd32f4::Peripherals::take().unwrap();
//! let mut rcu = dp.RCU.constrain();
//! let clocks = rcu
//!     .cfgr
//!     .use_hxtal(25.mhz())
//!     .sysclk(200.mhz())
//!     .freeze(&dp.FMC, &dp.PMU)?;
//! let gpioa = dp.GPIOA.split(&mut rcu.ahb1);
//! ```
//!
//! Instance numbering follows the GD32 manuals: `USART0`, `SPI0`, `CAN0`
//! correspond to the first instance.

pub mod board;
pub mod can;
pub mod crc;
pub mod exti;
pub mod gpio;
pub mod rcu;
pub mod spi;
pub mod trng;
pub mod usart;
pub mod watchdog;

use crate::nvic::interrupts;
use crate::reg::peripherals;

peripherals! {
    /// Reset and clock unit
    RCU: rcu::RcuRegisters = 0x4002_3800,
    /// Flash memory controller
    FMC: rcu::FmcRegisters = 0x4002_3C00,
    /// Power management unit
    PMU: rcu::PmuRegisters = 0x4000_7000,
    GPIOA: gpio::GpioRegisters = 0x4002_0000,
    GPIOB: gpio::GpioRegisters = 0x4002_0400,
    GPIOC: gpio::GpioRegisters = 0x4002_0800,
    GPIOD: gpio::GpioRegisters = 0x4002_0C00,
    GPIOE: gpio::GpioRegisters = 0x4002_1000,
    GPIOF: gpio::GpioRegisters = 0x4002_1400,
    GPIOG: gpio::GpioRegisters = 0x4002_1800,
    GPIOH: gpio::GpioRegisters = 0x4002_1C00,
    GPIOI: gpio::GpioRegisters = 0x4002_2000,
    USART0: usart::UsartRegisters = 0x4001_1000,
    USART1: usart::UsartRegisters = 0x4000_4400,
    USART2: usart::UsartRegisters = 0x4000_4800,
    UART3: usart::UsartRegisters = 0x4000_4C00,
    UART4: usart::UsartRegisters = 0x4000_5000,
    USART5: usart::UsartRegisters = 0x4001_1400,
    SPI0: spi::SpiRegisters = 0x4001_3000,
    SPI1: spi::SpiRegisters = 0x4000_3800,
    SPI2: spi::SpiRegisters = 0x4000_3C00,
    /// Free watchdog timer
    FWDGT: watchdog::FwdgtRegisters = 0x4000_3000,
    /// Window watchdog timer
    WWDGT: watchdog::WwdgtRegisters = 0x4000_2C00,
    CRC: crc::CrcRegisters = 0x4002_3000,
    /// True random number generator
    TRNG: trng::TrngRegisters = 0x5006_0800,
    /// Interrupt/event controller
    EXTI: exti::ExtiRegisters = 0x4001_3C00,
    /// System configuration
    SYSCFG: exti::SyscfgRegisters = 0x4001_3800,
    CAN0: bxcan::RegisterBlock = 0x4000_6400,
    CAN1: bxcan::RegisterBlock = 0x4000_6800,
}

interrupts! {
    /// Interrupt lines of the peripherals driven by this crate
    chip: "gd32f4",
    vectors: 91,
    lines: {
        WWDGT = 0,
        EXTI0 = 6,
        EXTI1 = 7,
        EXTI2 = 8,
        EXTI3 = 9,
        EXTI4 = 10,
        CAN0_TX = 19,
        CAN0_RX0 = 20,
        CAN0_RX1 = 21,
        CAN0_EWMC = 22,
        EXTI5_9 = 23,
        SPI0 = 35,
        SPI1 = 36,
        USART0 = 37,
        USART1 = 38,
        USART2 = 39,
        EXTI10_15 = 40,
        SPI2 = 51,
        UART3 = 52,
        UART4 = 53,
        CAN1_TX = 63,
        CAN1_RX0 = 64,
        CAN1_RX1 = 65,
        CAN1_EWMC = 66,
        USART5 = 71,
        TRNG = 80,
    }
}

#[cfg(test)]
mod tests {
    use super::Interrupt;

    #[test]
    fn vector_table_covers_every_line() {
        crate::nvic::tests::check_vectors!(Interrupt, include_str!("../../device/gd32f4.x"));
        assert_eq!(Interrupt::USART0.handler(), "USART0");
    }
}
