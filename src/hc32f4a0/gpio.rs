// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose I/Os
//!
//! All ports share one register block. Each pin has its own control
//! (`PCR`) and function select (`PFSR`) register, both behind the `PWPR`
//! write protection, which is opened around every reconfiguration.
//!
//! The pads have a pull-up but no pull-down; [`PullDown`] inputs float.
//! Function numbers run from 0 (GPIO) to 63.
//!
//! [`PullDown`]: crate::gpio::PullDown

use super::GPIO;
use crate::gpio::{gpio_port, Function, GpioExt, GpioPort, Input, OutputType, Pin, PinConfig, Pull, Speed};
use crate::reg::{
    register_bitfields, Peripheral, ReadOnly, ReadWrite, ReadWriteable, Readable, StaticRef,
    WriteOnly, Writeable,
};

const PWPR_UNLOCK: u16 = 0xA501;
const PWPR_LOCK: u16 = 0xA500;

register_bitfields![u16,
    PCR [
        DDIS OFFSET(15) NUMBITS(1) [],
        LTE OFFSET(14) NUMBITS(1) [],
        INTE OFFSET(12) NUMBITS(1) [],
        INVE OFFSET(9) NUMBITS(1) [],
        PUU OFFSET(6) NUMBITS(1) [],
        DRV OFFSET(4) NUMBITS(2) [
            Low = 0,
            Mid = 1,
            High = 2
        ],
        NOD OFFSET(2) NUMBITS(1) [],
        POUTE OFFSET(1) NUMBITS(1) [],
        POUT OFFSET(0) NUMBITS(1) []
    ],
    PFSR [
        BFE OFFSET(8) NUMBITS(1) [],
        FSEL OFFSET(0) NUMBITS(6) []
    ]
];

#[repr(C)]
struct PortRegisters {
    pidr: ReadOnly<u16>,
    _reserved0: [u8; 2],
    podr: ReadWrite<u16>,
    poer: ReadWrite<u16>,
    posr: WriteOnly<u16>,
    porr: WriteOnly<u16>,
    potr: WriteOnly<u16>,
    _reserved1: [u8; 2],
}

#[repr(C)]
struct PinRegisters {
    pcr: ReadWrite<u16, PCR::Register>,
    pfsr: ReadWrite<u16, PFSR::Register>,
}

#[repr(C)]
pub struct GpioRegisters {
    port: [PortRegisters; 9],
    _reserved0: [u8; 0x364],
    pspcr: ReadWrite<u16>,
    _reserved1: [u8; 2],
    pccr: ReadWrite<u16>,
    pinaer: ReadWrite<u16>,
    pwpr: ReadWrite<u16>,
    _reserved2: [u8; 2],
    pin: [[PinRegisters; 16]; 9],
}

/// Sets the `PCCR.RDWT` read wait cycles of all ports
pub(crate) fn set_read_wait(regs: &GpioRegisters, cycles: u16) {
    regs.pwpr.set(PWPR_UNLOCK);
    regs.pccr.set((regs.pccr.get() & !(0b11 << 14)) | ((cycles & 0b11) << 14));
    regs.pwpr.set(PWPR_LOCK);
}

/// One port of the shared register block
#[derive(Clone, Copy)]
pub struct Port {
    regs: StaticRef<GpioRegisters>,
    index: u8,
}

#[cfg(test)]
impl Port {
    pub(crate) fn mock(index: u8) -> Port {
        Port {
            regs: crate::reg::mock::block(),
            index,
        }
    }
}

impl Port {
    fn port(&self) -> &PortRegisters {
        &self.regs.port[usize::from(self.index)]
    }

    fn pin(&self, pin: u8) -> &PinRegisters {
        &self.regs.pin[usize::from(self.index)][usize::from(pin & 0xF)]
    }

    fn unprotected(&self, f: impl FnOnce()) {
        self.regs.pwpr.set(PWPR_UNLOCK);
        f();
        self.regs.pwpr.set(PWPR_LOCK);
    }

    fn set_interrupt(&self, pin: u8, enable: bool) {
        let pcr = &self.pin(pin).pcr;
        self.unprotected(|| pcr.modify(PCR::INTE.val(enable.into())));
    }
}

impl GpioPort for Port {
    fn configure(&self, pin: u8, config: PinConfig) {
        let regs = self.pin(pin);
        let (fsel, output, analog) = match config.function {
            Function::Input => (0, false, false),
            Function::Output => (0, true, false),
            Function::Alternate(func) => (func & 0x3F, false, false),
            Function::Analog => (0, false, true),
        };
        self.unprotected(|| {
            regs.pfsr.modify(PFSR::FSEL.val(fsel.into()));
            regs.pcr.modify(
                PCR::DDIS.val(analog.into())
                    + PCR::POUTE.val(output.into())
                    + PCR::NOD.val((config.otype == OutputType::OpenDrain).into())
                    + PCR::PUU.val((config.pull == Pull::Up).into()),
            );
        });
    }

    /// Low, middle and high drive; the two fastest grades share the high one
    fn set_speed(&self, pin: u8, speed: Speed) {
        let drv = match speed {
            Speed::Low => PCR::DRV::Low,
            Speed::Medium => PCR::DRV::Mid,
            Speed::High | Speed::VeryHigh => PCR::DRV::High,
        };
        let pcr = &self.pin(pin).pcr;
        self.unprotected(|| pcr.modify(drv));
    }

    #[inline(always)]
    fn set_pins(&self, mask: u16) {
        self.port().posr.set(mask);
    }

    #[inline(always)]
    fn reset_pins(&self, mask: u16) {
        self.port().porr.set(mask);
    }

    #[inline(always)]
    fn input(&self) -> u16 {
        self.port().pidr.get()
    }

    #[inline(always)]
    fn output(&self) -> u16 {
        self.port().podr.get()
    }

    /// Clears the pin's `SPFE` bit in `PSPCR`
    fn release_debug_pin(&self, pin: u8) {
        let bit = match (self.index, pin) {
            (0, 13..=15) => pin - 13,
            (1, 3 | 4) => pin,
            _ => return,
        };
        let pspcr = &self.regs.pspcr;
        self.unprotected(|| pspcr.set(pspcr.get() & !(1 << bit)));
    }
}

impl<const P: char, const N: u8, MODE> Pin<Port, P, N, Input<MODE>> {
    /// Routes the pin to its EIRQ channel
    ///
    /// Pin `N` of every port shares channel `N`; configure it through
    /// [`super::intc`].
    pub fn enable_interrupt(&mut self) {
        self.port().set_interrupt(N, true)
    }

    pub fn disable_interrupt(&mut self) {
        self.port().set_interrupt(N, false)
    }
}

/// All ports
pub struct Parts {
    pub gpioa: gpioa::Parts,
    pub gpiob: gpiob::Parts,
    pub gpioc: gpioc::Parts,
    pub gpiod: gpiod::Parts,
    pub gpioe: gpioe::Parts,
    pub gpiof: gpiof::Parts,
    pub gpiog: gpiog::Parts,
    pub gpioh: gpioh::Parts,
    pub gpioi: gpioi::Parts,
}

impl GpioExt for GPIO {
    type Parts = Parts;
    /// GPIO is always clocked
    type Bus = ();

    fn split(self, _: &mut ()) -> Parts {
        let regs = self.registers();
        let port = |index| Port { regs, index };
        Parts {
            gpioa: gpioa::Parts::new(port(0)),
            gpiob: gpiob::Parts::new(port(1)),
            gpioc: gpioc::Parts::new(port(2)),
            gpiod: gpiod::Parts::new(port(3)),
            gpioe: gpioe::Parts::new(port(4)),
            gpiof: gpiof::Parts::new(port(5)),
            gpiog: gpiog::Parts::new(port(6)),
            gpioh: gpioh::Parts::new(port(7)),
            gpioi: gpioi::Parts::new(port(8)),
        }
    }
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
]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::mock;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(GpioRegisters, pspcr), 0x3F4);
        assert_eq!(offset_of!(GpioRegisters, pwpr), 0x3FC);
        assert_eq!(offset_of!(GpioRegisters, pin), 0x400);
        assert_eq!(core::mem::size_of::<PortRegisters>(), 0x10);
    }

    #[test]
    fn console_tx_function() {
        let port = Port::mock(7);
        let gpioh = gpioh::Parts::new(port);
        let _tx = gpioh.ph15.into_alternate::<32>();
        // PFSRH15 sits at 0x400 + 0x40 * 7 + 4 * 15 + 2
        assert_eq!(mock::peek16(port.regs, 0x5FE), 32);
        assert_eq!(mock::peek16(port.regs, 0x5FC) & 1 << 1, 0);
        assert_eq!(mock::peek16(port.regs, 0x3FC), PWPR_LOCK);
    }

    #[test]
    fn output_levels_and_pull_up() {
        let port = Port::mock(0);
        let gpioa = gpioa::Parts::new(port);
        let mut led = gpioa.pa2.into_push_pull_output();
        assert_eq!(mock::peek16(port.regs, 0x408), 1 << 1);
        led.set_high();
        assert_eq!(mock::peek16(port.regs, 0x08), 1 << 2);
        led.set_low();
        assert_eq!(mock::peek16(port.regs, 0x0A), 1 << 2);

        let mut key = gpioa.pa0.into_pull_up_input();
        assert_eq!(mock::peek16(port.regs, 0x400), 1 << 6);
        key.enable_interrupt();
        assert_eq!(mock::peek16(port.regs, 0x400), 1 << 6 | 1 << 12);
        key.disable_interrupt();
        assert_eq!(mock::peek16(port.regs, 0x400), 1 << 6);

        mock::poke16(port.regs, 0x00, 1);
        assert!(key.is_high());
    }

    #[test]
    fn jtag_release_keeps_swd() {
        let gpio = unsafe { GPIO::at(mock::block()) };
        let regs = gpio.registers();
        mock::poke16(regs, 0x3F4, 0x1F);
        let parts = gpio.split(&mut ());
        let (_pa15, pb3, _pb4) =
            crate::gpio::disable_jtag(parts.gpioa.pa15, parts.gpiob.pb3, parts.gpiob.pb4);
        assert_eq!(mock::peek16(regs, 0x3F4), 0b00011);
        assert_eq!(mock::peek16(regs, 0x3FC), PWPR_LOCK);

        let _out = pb3.into_push_pull_output();
        // PCRB3
        assert_eq!(mock::peek16(regs, 0x400 + 0x40 + 4 * 3), 1 << 1);
    }
}
