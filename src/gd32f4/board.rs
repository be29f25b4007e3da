// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GD32450I-EVAL
//!
//! LED1 to LED3 sit on PE2, PE3 and PF10, the wakeup key on PA0; the
//! console is USART0 through the on-board RS-232 transceiver.

use cortex_m::peripheral::SYST;

use super::gpio::{PA0, PA10, PA9, PE2, PE3, PF10};
use super::rcu::{Rcu, RcuExt, CK_APB1_MAX, CK_APB2_MAX, HXTAL_VALUE};
use super::{Peripherals, USART0};
use crate::bsp::{self, console, BoardInfo, Button, Led, Polarity};
use crate::clocks::Clocks;
use crate::delay::Delay;
use crate::gpio::{Alternate, Floating, GpioExt, Input, Output, PushPull};
use crate::serial::{Config, Serial, Tx};
use crate::time::{Bps, Hertz};

/// Facts about the GD32450I-EVAL
pub const INFO: BoardInfo = BoardInfo {
    name: "GD32450I-EVAL",
    crystal: HXTAL_VALUE,
    sysclk: Hertz(200_000_000),
    led_polarity: Polarity::ActiveHigh,
    button_polarity: Polarity::ActiveHigh,
    console_baud: Bps(115_200),
};

pub type Led1 = Led<PE2<Output<PushPull>>>;
pub type Led2 = Led<PE3<Output<PushPull>>>;
pub type Led3 = Led<PF10<Output<PushPull>>>;
pub type WakeupKey = Button<PA0<Input<Floating>>>;
/// Transmit half bound to `println!`
pub type Console = Tx<USART0>;

pub struct Board {
    pub clocks: Clocks,
    pub delay: Delay,
    pub leds: (Led1, Led2, Led3),
    pub button: WakeupKey,
}

struct Parts {
    clocks: Clocks,
    serial: Serial<USART0, (PA9<Alternate<7>>, PA10<Alternate<7>>)>,
    leds: (Led1, Led2, Led3),
    button: WakeupKey,
}

fn bring_up(dp: Peripherals) -> Result<Parts, bsp::Error> {
    let Rcu {
        mut ahb1,
        mut apb2,
        cfgr,
        ..
    } = dp.RCU.constrain();
    let clocks = cfgr
        .use_hxtal(INFO.crystal)
        .sysclk(INFO.sysclk)
        .pclk1(Hertz(CK_APB1_MAX))
        .pclk2(Hertz(CK_APB2_MAX))
        .freeze(&dp.FMC, &dp.PMU)?;

    let gpioa = dp.GPIOA.split(&mut ahb1);
    let gpioe = dp.GPIOE.split(&mut ahb1);
    let gpiof = dp.GPIOF.split(&mut ahb1);

    let pins: (PA9<Alternate<7>>, PA10<Alternate<7>>) =
        (gpioa.pa9.into_alternate(), gpioa.pa10.into_alternate());
    let serial = Serial::new(
        dp.USART0,
        pins,
        Config::default().baudrate(INFO.console_baud),
        &clocks,
        &mut apb2,
    )?;

    Ok(Parts {
        clocks,
        serial,
        leds: (
            Led::new(gpioe.pe2.into_push_pull_output(), INFO.led_polarity),
            Led::new(gpioe.pe3.into_push_pull_output(), INFO.led_polarity),
            Led::new(gpiof.pf10.into_push_pull_output(), INFO.led_polarity),
        ),
        button: Button::new(gpioa.pa0, INFO.button_polarity),
    })
}

/// Runs the core at 200 MHz from the 25 MHz crystal and installs the console
pub fn init(dp: Peripherals, syst: SYST) -> Result<Board, bsp::Error> {
    let parts = bring_up(dp)?;
    let (tx, _) = parts.serial.split();
    console::install(
        cortex_m::singleton!(: Console = tx).ok_or(bsp::Error::AlreadyInitialized)?,
    );

    Ok(Board {
        clocks: parts.clocks,
        delay: Delay::new(syst, parts.clocks),
        leds: parts.leds,
        button: parts.button,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::{mock, Peripheral};
    use crate::serial::brr_over16;

    #[test]
    fn console_runs_from_apb2() {
        assert_eq!(brr_over16(Hertz(CK_APB2_MAX), INFO.console_baud), Ok(868));
    }

    #[test]
    fn bring_up_on_mock_registers() {
        let dp = Peripherals::mock();
        let rcu = dp.RCU.registers();
        let pmu = dp.PMU.registers();
        let gpioe = dp.GPIOE.registers();
        let gpiof = dp.GPIOF.registers();
        let usart0 = dp.USART0.registers();
        mock::poke(rcu, 0x00, 1 << 17 | 1 << 25);
        mock::poke(rcu, 0x08, 0b10 << 2);
        // high-drive mode ready and switched
        mock::poke(pmu, 0x04, 1 << 16 | 1 << 17);

        let mut parts = bring_up(dp).unwrap();
        assert_eq!(parts.clocks.sysclk(), INFO.sysclk);
        assert_eq!(parts.clocks.pclk2(), Hertz(CK_APB2_MAX));
        assert_eq!(mock::peek(rcu, 0x44) & 1 << 4, 1 << 4);
        assert_eq!(mock::peek(usart0, 0x08), 868);

        assert_eq!(mock::peek(gpioe, 0x00), 0b0101 << 4);
        assert_eq!(mock::peek(gpiof, 0x00), 0b01 << 20);
        parts.leds.2.on();
        assert_eq!(mock::peek(gpiof, 0x18), 1 << 10);
    }
}
