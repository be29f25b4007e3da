// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External interrupt controller (EXINT) and its SCFG line multiplexer

use super::crm::APB2;
use super::SCFG;
use crate::clocks::Enable;
use crate::exti::{self, SourceSelect};
use crate::reg::{write_field, Peripheral, ReadWrite, Readable, Writeable};

#[repr(C)]
pub struct ExintRegisters {
    inten: ReadWrite<u32>,
    evten: ReadWrite<u32>,
    /// rising edge
    polcfg1: ReadWrite<u32>,
    /// falling edge
    polcfg2: ReadWrite<u32>,
    swtrg: ReadWrite<u32>,
    intsts: ReadWrite<u32>,
}

impl exti::ExtiRegisters for ExintRegisters {
    const LINES: u8 = 23;

    fn set_interrupt_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.inten, line.into(), 1, unmasked.into());
    }

    fn set_event_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.evten, line.into(), 1, unmasked.into());
    }

    fn set_edges(&self, line: u8, rising: bool, falling: bool) {
        write_field(&self.polcfg1, line.into(), 1, rising.into());
        write_field(&self.polcfg2, line.into(), 1, falling.into());
    }

    fn trigger(&self, line: u8) {
        self.swtrg.set(1 << line);
    }

    fn is_pending(&self, line: u8) -> bool {
        self.intsts.get() >> line & 1 != 0
    }

    fn clear_pending(&self, line: u8) {
        self.intsts.set(1 << line);
    }
}

#[repr(C)]
pub struct ScfgRegisters {
    cfg1: ReadWrite<u32>,
    cfg2: ReadWrite<u32>,
    exintc: [ReadWrite<u32>; 4],
}

pub trait ScfgExt {
    fn constrain(self, apb2: &mut APB2) -> Scfg;
}

impl ScfgExt for SCFG {
    fn constrain(self, apb2: &mut APB2) -> Scfg {
        SCFG::enable(apb2);
        Scfg { scfg: self }
    }
}

/// Clocked system configuration controller
pub struct Scfg {
    scfg: SCFG,
}

impl Scfg {
    pub fn free(self) -> SCFG {
        self.scfg
    }
}

impl SourceSelect for Scfg {
    fn select(&mut self, line: u8, port: u8) {
        if line < 16 {
            let regs = self.scfg.registers();
            let line = u32::from(line);
            write_field(&regs.exintc[(line / 4) as usize], (line % 4) * 4, 4, port.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::gpio::{gpioa, Port};
    use super::super::EXINT;
    use super::*;
    use crate::exti::{Edge, Exti};
    use crate::reg::mock;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(ExintRegisters, intsts), 0x14);
        assert_eq!(offset_of!(ScfgRegisters, exintc), 0x08);
    }

    #[test]
    fn user_button_both_edges() {
        let exint = unsafe { EXINT::at(mock::block()) };
        let regs = exint.registers();
        let scfg = unsafe { SCFG::at(mock::block()) };
        let scfg_regs = scfg.registers();
        let crm = mock::block();
        let mut scfg = scfg.constrain(&mut APB2::new(crm));
        assert_eq!(mock::peek(crm, 0x44), 1 << 14);

        let gpioa = gpioa::Parts::new(Port::mock());
        let button = gpioa.pa0.into_pull_down_input();
        let mut exti = Exti::new(exint);
        exti.listen_gpio(&button, &mut scfg, Edge::RisingFalling);
        assert_eq!(mock::peek(scfg_regs, 0x08), 0);
        assert_eq!(mock::peek(regs, 0x00), 1);
        assert_eq!(mock::peek(regs, 0x08), 1);
        assert_eq!(mock::peek(regs, 0x0C), 1);

        mock::poke(regs, 0x14, 1);
        assert!(exti.is_pending(0));
        exti.unpend(0);
        assert_eq!(mock::peek(regs, 0x14), 1);
    }
}
