// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # STM32F405/407/415/417
//!
//! ```rust,ignore
//! let dp = stm32f4::Peripherals::take().unwrap();
//! let mut rcc = dp.RCC.constrain();
//! let clocks = rcc
//!     .cfgr
//!     .use_hse(8.mhz())
//!     .sysclk(168.mhz())
//!     .freeze(&dp.FLASH)?;
//! ```

pub mod board;
pub mod can;
pub mod crc;
pub mod exti;
pub mod gpio;
pub mod rcc;
pub mod rng;
pub mod spi;
pub mod usart;
pub mod watchdog;

use crate::nvic::interrupts;
use crate::reg::peripherals;

peripherals! {
    /// Reset and clock control
    RCC: rcc::RccRegisters = 0x4002_3800,
    /// Flash interface
    FLASH: rcc::FlashRegisters = 0x4002_3C00,
    GPIOA: gpio::GpioRegisters = 0x4002_0000,
    GPIOB: gpio::GpioRegisters = 0x4002_0400,
    GPIOC: gpio::GpioRegisters = 0x4002_0800,
    GPIOD: gpio::GpioRegisters = 0x4002_0C00,
    GPIOE: gpio::GpioRegisters = 0x4002_1000,
    GPIOF: gpio::GpioRegisters = 0x4002_1400,
    GPIOG: gpio::GpioRegisters = 0x4002_1800,
    GPIOH: gpio::GpioRegisters = 0x4002_1C00,
    GPIOI: gpio::GpioRegisters = 0x4002_2000,
    USART1: usart::UsartRegisters = 0x4001_1000,
    USART2: usart::UsartRegisters = 0x4000_4400,
    USART3: usart::UsartRegisters = 0x4000_4800,
    UART4: usart::UsartRegisters = 0x4000_4C00,
    UART5: usart::UsartRegisters = 0x4000_5000,
    USART6: usart::UsartRegisters = 0x4001_1400,
    SPI1: spi::SpiRegisters = 0x4001_3000,
    SPI2: spi::SpiRegisters = 0x4000_3800,
    SPI3: spi::SpiRegisters = 0x4000_3C00,
    /// Independent watchdog
    IWDG: watchdog::IwdgRegisters = 0x4000_3000,
    /// Window watchdog
    WWDG: watchdog::WwdgRegisters = 0x4000_2C00,
    CRC: crc::CrcRegisters = 0x4002_3000,
    RNG: rng::RngRegisters = 0x5006_0800,
    /// External interrupt/event controller
    EXTI: exti::ExtiRegisters = 0x4001_3C00,
    /// System configuration controller
    SYSCFG: exti::SyscfgRegisters = 0x4001_3800,
    CAN1: bxcan::RegisterBlock = 0x4000_6400,
    CAN2: bxcan::RegisterBlock = 0x4000_6800,
}

interrupts! {
    /// Interrupt lines of the peripherals driven by this crate
    chip: "stm32f4",
    vectors: 82,
    lines: {
        WWDG = 0,
        EXTI0 = 6,
        EXTI1 = 7,
        EXTI2 = 8,
        EXTI3 = 9,
        EXTI4 = 10,
        CAN1_TX = 19,
        CAN1_RX0 = 20,
        CAN1_RX1 = 21,
        CAN1_SCE = 22,
        EXTI9_5 = 23,
        SPI1 = 35,
        SPI2 = 36,
        USART1 = 37,
        USART2 = 38,
        USART3 = 39,
        EXTI15_10 = 40,
        SPI3 = 51,
        UART4 = 52,
        UART5 = 53,
        CAN2_TX = 63,
        CAN2_RX0 = 64,
        CAN2_RX1 = 65,
        CAN2_SCE = 66,
        USART6 = 71,
        HASH_RNG = 80,
    }
}
