// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AT-START-F435
//!
//! LED2 to LED4 (red, yellow, green) sink into PD13, PD14 and PD15, so they
//! light when the pin is low. The user button on PA0 pulls high. USART1 on
//! PA9/PA10 reaches the host through the AT-Link virtual COM port.

use cortex_m::peripheral::SYST;

use super::crm::{Crm, CrmExt, APB_MAX, HEXT_VALUE};
use super::gpio::{PA0, PA10, PA9, PD13, PD14, PD15};
use super::{Peripherals, USART1};
use crate::bsp::{self, console, BoardInfo, Button, Led, Polarity};
use crate::clocks::Clocks;
use crate::delay::Delay;
use crate::gpio::{Alternate, Floating, GpioExt, Input, Output, PushPull};
use crate::serial::{Config, Serial, Tx};
use crate::time::{Bps, Hertz};

/// Facts about the AT-START-F435
pub const INFO: BoardInfo = BoardInfo {
    name: "AT-START-F435",
    crystal: HEXT_VALUE,
    sysclk: Hertz(288_000_000),
    led_polarity: Polarity::ActiveLow,
    button_polarity: Polarity::ActiveHigh,
    console_baud: Bps(115_200),
};

pub type RedLed = Led<PD13<Output<PushPull>>>;
pub type YellowLed = Led<PD14<Output<PushPull>>>;
pub type GreenLed = Led<PD15<Output<PushPull>>>;
pub type UserButton = Button<PA0<Input<Floating>>>;
/// Transmit half bound to `println!`
pub type Console = Tx<USART1>;

pub struct Leds {
    pub red: RedLed,
    pub yellow: YellowLed,
    pub green: GreenLed,
}

pub struct Board {
    pub clocks: Clocks,
    pub delay: Delay,
    pub leds: Leds,
    pub button: UserButton,
}

struct Parts {
    clocks: Clocks,
    serial: Serial<USART1, (PA9<Alternate<7>>, PA10<Alternate<7>>)>,
    leds: Leds,
    button: UserButton,
}

fn bring_up(dp: Peripherals) -> Result<Parts, bsp::Error> {
    let Crm {
        mut ahb1,
        mut apb2,
        cfgr,
        ..
    } = dp.CRM.constrain();
    let clocks = cfgr
        .use_hext(INFO.crystal)
        .sysclk(INFO.sysclk)
        .pclk1(Hertz(APB_MAX))
        .pclk2(Hertz(APB_MAX))
        .freeze(&dp.FLASH, &dp.PWC)?;

    let gpioa = dp.GPIOA.split(&mut ahb1);
    let gpiod = dp.GPIOD.split(&mut ahb1);

    let tx: PA9<Alternate<7>> = gpioa.pa9.into_alternate();
    let rx: PA10<Alternate<7>> = gpioa.pa10.into_alternate();
    let serial = Serial::new(
        dp.USART1,
        (tx, rx),
        Config::default().baudrate(INFO.console_baud),
        &clocks,
        &mut apb2,
    )?;

    Ok(Parts {
        clocks,
        serial,
        leds: Leds {
            red: Led::new(gpiod.pd13.into_push_pull_output(), INFO.led_polarity),
            yellow: Led::new(gpiod.pd14.into_push_pull_output(), INFO.led_polarity),
            green: Led::new(gpiod.pd15.into_push_pull_output(), INFO.led_polarity),
        },
        button: Button::new(gpioa.pa0, INFO.button_polarity),
    })
}

/// Runs the core at 288 MHz from the 8 MHz crystal and installs the console
pub fn init(dp: Peripherals, syst: SYST) -> Result<Board, bsp::Error> {
    let Parts {
        clocks,
        serial,
        leds,
        button,
    } = bring_up(dp)?;
    let (tx, _) = serial.split();
    console::install(
        cortex_m::singleton!(: Console = tx).ok_or(bsp::Error::AlreadyInitialized)?,
    );

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
    fn console_divider() {
        assert_eq!(brr_over16(Hertz(APB_MAX), INFO.console_baud), Ok(1250));
    }

    #[test]
    fn leds_start_dark() {
        let dp = Peripherals::mock();
        let crm = dp.CRM.registers();
        let gpiod = dp.GPIOD.registers();
        let usart1 = dp.USART1.registers();
        mock::poke(crm, 0x00, 1 << 17 | 1 << 25);
        mock::poke(crm, 0x08, 0b10 << 2);

        let Parts { clocks, mut leds, .. } = bring_up(dp).unwrap();
        assert_eq!(clocks.sysclk(), INFO.sysclk);
        assert_eq!(mock::peek(crm, 0x44) & 1 << 4, 1 << 4);
        assert_eq!(mock::peek(usart1, 0x08), 1250);

        assert_eq!(mock::peek(gpiod, 0x00), 0b01_0101 << 26);
        // active low: off drives the pin high
        assert_eq!(mock::peek(gpiod, 0x18), 1 << 15);
        leds.red.on();
        assert_eq!(mock::peek(gpiod, 0x28), 1 << 13);
    }
}
