// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose I/Os
//!
//! Ports A to I. Output levels are set through `GPIOx_BOP` and cleared
//! through `GPIOx_BC`, so no pin write is a read-modify-write.

use super::rcu::AHB1;
use super::{GPIOA, GPIOB, GPIOC, GPIOD, GPIOE, GPIOF, GPIOG, GPIOH, GPIOI};
use crate::clocks::{Enable, Reset};
use crate::gpio::{gpio_port, Function, GpioExt, GpioPort, OutputType, PinConfig, Pull, Speed};
use crate::reg::{write_field, Peripheral, ReadOnly, ReadWrite, Readable, StaticRef, WriteOnly, Writeable};

#[repr(C)]
pub struct GpioRegisters {
    ctl: ReadWrite<u32>,
    omode: ReadWrite<u32>,
    ospd: ReadWrite<u32>,
    pud: ReadWrite<u32>,
    istat: ReadOnly<u32>,
    octl: ReadWrite<u32>,
    bop: WriteOnly<u32>,
    lock: ReadWrite<u32>,
    afsel: [ReadWrite<u32>; 2],
    bc: WriteOnly<u32>,
    tg: WriteOnly<u32>,
}

#[derive(Clone, Copy)]
pub struct Port {
    regs: StaticRef<GpioRegisters>,
}

#[cfg(test)]
impl Port {
    pub(crate) fn mock() -> Port {
        Port {
            regs: crate::reg::mock::block(),
        }
    }
}

impl GpioPort for Port {
    fn configure(&self, pin: u8, config: PinConfig) {
        let regs = &*self.regs;
        let pin = u32::from(pin);
        let ctl = match config.function {
            Function::Input => 0b00,
            Function::Output => 0b01,
            Function::Alternate(af) => {
                write_field(&regs.afsel[(pin / 8) as usize], (pin % 8) * 4, 4, u32::from(af));
                0b10
            }
            Function::Analog => 0b11,
        };
        let pud = match config.pull {
            Pull::None => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        };
        write_field(&regs.omode, pin, 1, (config.otype == OutputType::OpenDrain).into());
        write_field(&regs.pud, pin * 2, 2, pud);
        write_field(&regs.ctl, pin * 2, 2, ctl);
    }

    /// 2, 25, 50 and 200 MHz output stages
    fn set_speed(&self, pin: u8, speed: Speed) {
        let ospd = match speed {
            Speed::Low => 0b00,
            Speed::Medium => 0b01,
            Speed::High => 0b10,
            Speed::VeryHigh => 0b11,
        };
        write_field(&self.regs.ospd, u32::from(pin) * 2, 2, ospd);
    }

    #[inline(always)]
    fn set_pins(&self, mask: u16) {
        self.regs.bop.set(u32::from(mask));
    }

    #[inline(always)]
    fn reset_pins(&self, mask: u16) {
        self.regs.bc.set(u32::from(mask));
    }

    #[inline(always)]
    fn input(&self) -> u16 {
        self.regs.istat.get() as u16
    }

    #[inline(always)]
    fn output(&self) -> u16 {
        self.regs.octl.get() as u16
    }
}

macro_rules! split {
    ($($GPIOX:ident => $gpiox:ident,)+) => {
        $(
            impl GpioExt for $GPIOX {
                type Parts = $gpiox::Parts;
                type Bus = AHB1;

                fn split(self, ahb: &mut AHB1) -> $gpiox::Parts {
                    $GPIOX::enable(ahb);
                    $GPIOX::reset(ahb);
                    $gpiox::Parts::new(Port {
                        regs: self.registers(),
                    })
                }
            }
        )+
    };
}

split! {
    GPIOA => gpioa,
    GPIOB => gpiob,
    GPIOC => gpioc,
    GPIOD => gpiod,
    GPIOE => gpioe,
    GPIOF => gpiof,
    GPIOG => gpiog,
    GPIOH => gpioh,
    GPIOI => gpioi,
}

gpio_port!(gpioa, Port, 'A', [
    PA0: (pa0, 0),
    PA1: (pa1, 1),
    PA2: (pa2, 2),
    PA3: (pa3, 3),
    PA4: (pa4, 4),
    PA5: (pa5, 5),
    PA6: (pa6, 6),
    PA7: (pa7, 7),
    PA8: (pa8, 8),
    PA9: (pa9, 9),
    PA10: (pa10, 10),
    PA11: (pa11, 11),
    PA12: (pa12, 12),
    PA13: (pa13, 13, Debugger),
    PA14: (pa14, 14, Debugger),
    PA15: (pa15, 15, Debugger),
]);

gpio_port!(gpiob, Port, 'B', [
    PB0: (pb0, 0),
    PB1: (pb1, 1),
    PB2: (pb2, 2),
    PB3: (pb3, 3, Debugger),
    PB4: (pb4, 4, Debugger),
    PB5: (pb5, 5),
    PB6: (pb6, 6),
    PB7: (pb7, 7),
    PB8: (pb8, 8),
    PB9: (pb9, 9),
    PB10: (pb10, 10),
    PB11: (pb11, 11),
    PB12: (pb12, 12),
    PB13: (pb13, 13),
    PB14: (pb14, 14),
    PB15: (pb15, 15),
]);

gpio_port!(gpioc, Port, 'C', [
    PC0: (pc0, 0),
    PC1: (pc1, 1),
    PC2: (pc2, 2),
    PC3: (pc3, 3),
    PC4: (pc4, 4),
    PC5: (pc5, 5),
    PC6: (pc6, 6),
    PC7: (pc7, 7),
    PC8: (pc8, 8),
    PC9: (pc9, 9),
    PC10: (pc10, 10),
    PC11: (pc11, 11),
    PC12: (pc12, 12),
    PC13: (pc13, 13),
    PC14: (pc14, 14),
    PC15: (pc15, 15),
]);

gpio_port!(gpiod, Port, 'D', [
    PD0: (pd0, 0),
    PD1: (pd1, 1),
    PD2: (pd2, 2),
    PD3: (pd3, 3),
    PD4: (pd4, 4),
    PD5: (pd5, 5),
    PD6: (pd6, 6),
    PD7: (pd7, 7),
    PD8: (pd8, 8),
    PD9: (pd9, 9),
    PD10: (pd10, 10),
    PD11: (pd11, 11),
    PD12: (pd12, 12),
    PD13: (pd13, 13),
    PD14: (pd14, 14),
    PD15: (pd15, 15),
]);

gpio_port!(gpioe, Port, 'E', [
    PE0: (pe0, 0),
    PE1: (pe1, 1),
    PE2: (pe2, 2),
    PE3: (pe3, 3),
    PE4: (pe4, 4),
    PE5: (pe5, 5),
    PE6: (pe6, 6),
    PE7: (pe7, 7),
    PE8: (pe8, 8),
    PE9: (pe9, 9),
    PE10: (pe10, 10),
    PE11: (pe11, 11),
    PE12: (pe12, 12),
    PE13: (pe13, 13),
    PE14: (pe14, 14),
    PE15: (pe15, 15),
]);

gpio_port!(gpiof, Port, 'F', [
    PF0: (pf0, 0),
    PF1: (pf1, 1),
    PF2: (pf2, 2),
    PF3: (pf3, 3),
    PF4: (pf4, 4),
    PF5: (pf5, 5),
    PF6: (pf6, 6),
    PF7: (pf7, 7),
    PF8: (pf8, 8),
    PF9: (pf9, 9),
    PF10: (pf10, 10),
    PF11: (pf11, 11),
    PF12: (pf12, 12),
    PF13: (pf13, 13),
    PF14: (pf14, 14),
    PF15: (pf15, 15),
]);

gpio_port!(gpiog, Port, 'G', [
    PG0: (pg0, 0),
    PG1: (pg1, 1),
    PG2: (pg2, 2),
    PG3: (pg3, 3),
    PG4: (pg4, 4),
    PG5: (pg5, 5),
    PG6: (pg6, 6),
    PG7: (pg7, 7),
    PG8: (pg8, 8),
    PG9: (pg9, 9),
    PG10: (pg10, 10),
    PG11: (pg11, 11),
    PG12: (pg12, 12),
    PG13: (pg13, 13),
    PG14: (pg14, 14),
    PG15: (pg15, 15),
]);

gpio_port!(gpioh, Port, 'H', [
    PH0: (ph0, 0),
    PH1: (ph1, 1),
    PH2: (ph2, 2),
    PH3: (ph3, 3),
    PH4: (ph4, 4),
    PH5: (ph5, 5),
    PH6: (ph6, 6),
    PH7: (ph7, 7),
    PH8: (ph8, 8),
    PH9: (ph9, 9),
    PH10: (ph10, 10),
    PH11: (ph11, 11),
    PH12: (ph12, 12),
    PH13: (ph13, 13),
    PH14: (ph14, 14),
    PH15: (ph15, 15),
]);

gpio_port!(gpioi, Port, 'I', [
    PI0: (pi0, 0),
    PI1: (pi1, 1),
    PI2: (pi2, 2),
    PI3: (pi3, 3),
    PI4: (pi4, 4),
    PI5: (pi5, 5),
    PI6: (pi6, 6),
    PI7: (pi7, 7),
    PI8: (pi8, 8),
    PI9: (pi9, 9),
    PI10: (pi10, 10),
    PI11: (pi11, 11),
    PI12: (pi12, 12),
    PI13: (pi13, 13),
    PI14: (pi14, 14),
    PI15: (pi15, 15),
]);
