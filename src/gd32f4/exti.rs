// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EXTI controller and SYSCFG source selection

use super::rcu::APB2;
use super::SYSCFG;
use crate::clocks::Enable;
use crate::exti::{self, SourceSelect};
use crate::reg::{write_field, Peripheral, ReadWrite, Readable, Writeable};

#[repr(C)]
pub struct ExtiRegisters {
    inten: ReadWrite<u32>,
    even: ReadWrite<u32>,
    rten: ReadWrite<u32>,
    ften: ReadWrite<u32>,
    swiev: ReadWrite<u32>,
    pd: ReadWrite<u32>,
}

impl exti::ExtiRegisters for ExtiRegisters {
    const LINES: u8 = 23;

    fn set_interrupt_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.inten, line.into(), 1, unmasked.into());
    }

    fn set_event_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.even, line.into(), 1, unmasked.into());
    }

    fn set_edges(&self, line: u8, rising: bool, falling: bool) {
        write_field(&self.rten, line.into(), 1, rising.into());
        write_field(&self.ften, line.into(), 1, falling.into());
    }

    fn trigger(&self, line: u8) {
        write_field(&self.swiev, line.into(), 1, 1);
    }

    fn is_pending(&self, line: u8) -> bool {
        self.pd.get() >> line & 1 != 0
    }

    fn clear_pending(&self, line: u8) {
        self.pd.set(1 << line);
    }
}

#[repr(C)]
pub struct SyscfgRegisters {
    cfg0: ReadWrite<u32>,
    cfg1: ReadWrite<u32>,
    extiss: [ReadWrite<u32>; 4],
}

/// Extension trait that clocks the `SYSCFG` peripheral
pub trait SysCfgExt {
    fn constrain(self, apb2: &mut APB2) -> SysCfg;
}

impl SysCfgExt for SYSCFG {
    fn constrain(self, apb2: &mut APB2) -> SysCfg {
        SYSCFG::enable(apb2);
        SysCfg(self)
    }
}

/// Clocked SYSCFG
pub struct SysCfg(SYSCFG);

impl SourceSelect for SysCfg {
    fn select(&mut self, line: u8, port: u8) {
        if line < 16 {
            let regs = self.0.registers();
            let line = u32::from(line);
            write_field(&regs.extiss[(line / 4) as usize], (line % 4) * 4, 4, port.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::gpio::{gpioa, Port};
    use super::super::EXTI;
    use super::*;
    use crate::exti::{Edge, Exti};
    use crate::reg::mock;

    #[test]
    fn wakeup_button() {
        let exti = unsafe { EXTI::at(mock::block()) };
        let regs = exti.registers();
        let syscfg = unsafe { SYSCFG::at(mock::block()) };
        let sysregs = syscfg.registers();
        mock::poke(sysregs, 0x08, 0xFFFF);
        let mut syscfg = syscfg.constrain(&mut APB2::new(mock::block()));

        let gpioa = gpioa::Parts::new(Port::mock());
        let button = gpioa.pa0.into_floating_input();
        let mut exti = Exti::new(exti);
        exti.listen_gpio(&button, &mut syscfg, Edge::Rising);
        assert_eq!(mock::peek(sysregs, 0x08), 0xFFF0);
        assert_eq!(mock::peek(regs, 0x00), 1);
        assert_eq!(mock::peek(regs, 0x08), 1);

        exti.listen_event(22, Edge::Falling);
        assert_eq!(mock::peek(regs, 0x04), 1 << 22);
        assert_eq!(mock::peek(regs, 0x0C), 1 << 22);
        exti.unlisten_event(22);
        assert_eq!(mock::peek(regs, 0x04), 0);
    }
}
