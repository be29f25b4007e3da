// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HC32F4A0 EVB
//!
//! - 8 MHz crystal, core at 240 MHz
//! - wakeup key K10 on PA0, active low
//! - console on USART1, TX on PH15 and RX on PH13
//!
//! The red, yellow and blue LEDs hang off the TCA9539 I2C expander and are
//! not driven here.

use cortex_m::peripheral::SYST;

use super::cmu::{Cmu, CmuExt, PCLK1_MAX, PCLK4_MAX, XTAL_VALUE};
use super::gpio::{PA0, PH13, PH15};
use super::{Peripherals, USART1};
use crate::bsp::{self, console, BoardInfo, Button, Polarity};
use crate::clocks::Clocks;
use crate::delay::Delay;
use crate::gpio::{Alternate, GpioExt, Input, PullUp};
use crate::serial::{Config, Serial, Tx};
use crate::time::{Bps, Hertz};

/// Facts about the HC32F4A0 EVB
pub const INFO: BoardInfo = BoardInfo {
    name: "HC32F4A0 EVB",
    crystal: XTAL_VALUE,
    sysclk: Hertz(240_000_000),
    led_polarity: Polarity::ActiveLow,
    button_polarity: Polarity::ActiveLow,
    console_baud: Bps(115_200),
};

pub type WakeupKey = Button<PA0<Input<PullUp>>>;
pub type ConsoleSerial = Serial<USART1, (PH15<Alternate<32>>, PH13<Alternate<33>>)>;
/// Transmit half bound to `println!`
pub type Console = Tx<USART1>;

pub struct Board {
    pub clocks: Clocks,
    pub delay: Delay,
    pub button: WakeupKey,
}

struct Parts {
    clocks: Clocks,
    serial: ConsoleSerial,
    button: WakeupKey,
}

fn bring_up(dp: Peripherals) -> Result<Parts, bsp::Error> {
    let Cmu { mut fcg3, cfgr, .. } = dp.CMU.constrain(dp.FCG);
    let clocks = cfgr
        .use_xtal(INFO.crystal)
        .sysclk(INFO.sysclk)
        .pclk1(Hertz(PCLK1_MAX))
        .pclk2(Hertz(PCLK4_MAX))
        .freeze(&dp.EFM, &dp.SRAMC, &dp.PWC, &dp.GPIO)?;

    let gpio = dp.GPIO.split(&mut ());
    let serial: ConsoleSerial = Serial::new(
        dp.USART1,
        (gpio.gpioh.ph15.into_alternate(), gpio.gpioh.ph13.into_alternate()),
        Config::default().baudrate(INFO.console_baud),
        &clocks,
        &mut fcg3,
    )?;

    Ok(Parts {
        clocks,
        serial,
        button: Button::new(gpio.gpioa.pa0.into_pull_up_input(), INFO.button_polarity),
    })
}

/// Runs the core at 240 MHz from the crystal and installs USART1 as the
/// `println!` console
pub fn init(dp: Peripherals, syst: SYST) -> Result<Board, bsp::Error> {
    let Parts {
        clocks,
        serial,
        button,
    } = bring_up(dp)?;
    let (tx, _) = serial.split();
    console::install(
        cortex_m::singleton!(: Console = tx).ok_or(bsp::Error::AlreadyInitialized)?,
    );

    Ok(Board {
        clocks,
        delay: Delay::new(syst, clocks),
        button,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hc32f4a0::usart::baud_divider;
    use crate::reg::{mock, Peripheral};

    #[test]
    fn console_runs_from_pclk1() {
        let div = baud_divider(Hertz(PCLK1_MAX), INFO.console_baud.0).unwrap();
        assert_eq!((div.psc, div.integer), (0, 64));
    }

    #[test]
    fn bring_up_on_mock_registers() {
        let dp = Peripherals::mock();
        let cmu = dp.CMU.registers();
        let gpio = dp.GPIO.registers();
        let usart1 = dp.USART1.registers();
        // XTAL and PLLH stable
        mock::poke8(cmu, 0x3C, 1 << 3 | 1 << 5);

        let parts = bring_up(dp).unwrap();
        assert_eq!(parts.clocks.sysclk(), INFO.sysclk);
        assert_eq!(parts.clocks.pclk1(), Hertz(PCLK1_MAX));
        assert_eq!(mock::peek(usart1, 0x08), 64 << 8 | 127);
        // PA0 pulled up
        assert_eq!(mock::peek16(gpio, 0x400) & 1 << 6, 1 << 6);
        assert_eq!(parts.button.is_pressed(), Ok(true));
        mock::poke16(gpio, 0x00, 1);
        assert_eq!(parts.button.is_pressed(), Ok(false));
    }
}
