// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! STM32F4-Discovery
//!
//! - 8 MHz crystal, core at 168 MHz
//! - green, orange, red and blue LEDs on PD12 to PD15, active high
//! - user button on PA0, active high
//! - console on USART2, TX on PA2 and RX on PA3

use cortex_m::peripheral::SYST;

use super::gpio::{PA0, PA2, PA3, PD12, PD13, PD14, PD15};
use super::rcc::{Rcc, RccExt, HSE_VALUE, PCLK1_MAX, PCLK2_MAX};
use super::{Peripherals, USART2};
use crate::bsp::{self, console, BoardInfo, Button, Led, Polarity};
use crate::clocks::Clocks;
use crate::delay::Delay;
use crate::gpio::{Alternate, Floating, GpioExt, Input, Output, PushPull};
use crate::serial::{Config, Serial, Tx};
use crate::time::{Bps, Hertz};

/// Facts about the STM32F4-Discovery
pub const INFO: BoardInfo = BoardInfo {
    name: "STM32F4-Discovery",
    crystal: HSE_VALUE,
    sysclk: Hertz(168_000_000),
    led_polarity: Polarity::ActiveHigh,
    button_polarity: Polarity::ActiveHigh,
    console_baud: Bps(115_200),
};

pub type GreenLed = Led<PD12<Output<PushPull>>>;
pub type OrangeLed = Led<PD13<Output<PushPull>>>;
pub type RedLed = Led<PD14<Output<PushPull>>>;
pub type BlueLed = Led<PD15<Output<PushPull>>>;
pub type UserButton = Button<PA0<Input<Floating>>>;
pub type ConsoleSerial = Serial<USART2, (PA2<Alternate<7>>, PA3<Alternate<7>>)>;
/// Transmit half bound to `println!`
pub type Console = Tx<USART2>;

pub struct Leds {
    pub green: GreenLed,
    pub orange: OrangeLed,
    pub red: RedLed,
    pub blue: BlueLed,
}

/// The board, brought up
pub struct Board {
    pub clocks: Clocks,
    pub delay: Delay,
    pub leds: Leds,
    pub button: UserButton,
}

/// What the board owns before the console and the delay are bound
struct Parts {
    clocks: Clocks,
    serial: ConsoleSerial,
    leds: Leds,
    button: UserButton,
}

fn bring_up(dp: Peripherals) -> Result<Parts, bsp::Error> {
    let Rcc {
        mut ahb1,
        mut apb1,
        cfgr,
        ..
    } = dp.RCC.constrain();
    let clocks = cfgr
        .use_hse(INFO.crystal)
        .sysclk(INFO.sysclk)
        .pclk1(Hertz(PCLK1_MAX))
        .pclk2(Hertz(PCLK2_MAX))
        .freeze(&dp.FLASH)?;

    let gpioa = dp.GPIOA.split(&mut ahb1);
    let gpiod = dp.GPIOD.split(&mut ahb1);

    let serial: ConsoleSerial = Serial::new(
        dp.USART2,
        (gpioa.pa2.into_alternate::<7>(), gpioa.pa3.into_alternate::<7>()),
        Config::default().baudrate(INFO.console_baud),
        &clocks,
        &mut apb1,
    )?;

    let polarity = INFO.led_polarity;
    Ok(Parts {
        clocks,
        serial,
        leds: Leds {
            green: Led::new(gpiod.pd12.into_push_pull_output(), polarity),
            orange: Led::new(gpiod.pd13.into_push_pull_output(), polarity),
            red: Led::new(gpiod.pd14.into_push_pull_output(), polarity),
            blue: Led::new(gpiod.pd15.into_push_pull_output(), polarity),
        },
        button: Button::new(gpioa.pa0, INFO.button_polarity),
    })
}

/// Brings the clock tree to 168 MHz, sets up LEDs, button and delay, and
/// installs USART2 as the `println!` console
pub fn init(dp: Peripherals, syst: SYST) -> Result<Board, bsp::Error> {
    let Parts {
        clocks,
        serial,
        leds,
        button,
    } = bring_up(dp)?;

    let (tx, _rx) = serial.split();
    let tx = cortex_m::singleton!(: Console = tx).ok_or(bsp::Error::AlreadyInitialized)?;
    console::install(tx);

    Ok(Board {
        clocks,
        delay: Delay::new(syst, clocks),
        leds,
        button,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::{mock, Peripheral};
    use crate::serial::brr_over16;

    #[test]
    fn console_baud_is_reachable() {
        assert_eq!(brr_over16(Hertz(PCLK1_MAX), INFO.console_baud), Ok(365));
        assert!(INFO.sysclk.0 <= super::super::rcc::SYSCLK_MAX);
    }

    #[test]
    fn bring_up_on_mock_registers() {
        let dp = Peripherals::mock();
        let rcc = dp.RCC.registers();
        let gpiod = dp.GPIOD.registers();
        let usart2 = dp.USART2.registers();
        // HSE and PLL ready, PLL selected
        mock::poke(rcc, 0x00, 1 << 17 | 1 << 25);
        mock::poke(rcc, 0x08, 0b10 << 2);

        let Parts { clocks, mut leds, .. } = bring_up(dp).unwrap();
        assert_eq!(clocks.sysclk(), INFO.sysclk);
        assert_eq!(clocks.pclk1(), Hertz(PCLK1_MAX));
        // GPIOA, GPIOD and USART2 clocked
        assert_eq!(mock::peek(rcc, 0x30) & 0b1001, 0b1001);
        assert_eq!(mock::peek(rcc, 0x40) & 1 << 17, 1 << 17);
        assert_eq!(mock::peek(usart2, 0x08), 365);

        // PD12 to PD15 are outputs
        assert_eq!(mock::peek(gpiod, 0x00), 0x5500_0000);
        leds.green.on();
        assert_eq!(mock::peek(gpiod, 0x18), 1 << 12);
    }
}
