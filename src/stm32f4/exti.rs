// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EXTI controller and the SYSCFG line multiplexer
//!
//! ```rust,ignore
//! let mut syscfg = dp.SYSCFG.constrain(&mut rcc.apb2);
//! let mut exti = Exti::new(dp.EXTI);
//! exti.listen_gpio(&button, &mut syscfg, Edge::Rising);
//! ```

use super::rcc::APB2;
use super::SYSCFG;
use crate::clocks::Enable;
use crate::exti::{self, SourceSelect};
use crate::reg::{write_field, Peripheral, ReadWrite, Readable, Writeable};

#[repr(C)]
pub struct ExtiRegisters {
    imr: ReadWrite<u32>,
    emr: ReadWrite<u32>,
    rtsr: ReadWrite<u32>,
    ftsr: ReadWrite<u32>,
    swier: ReadWrite<u32>,
    pr: ReadWrite<u32>,
}

impl exti::ExtiRegisters for ExtiRegisters {
    const LINES: u8 = 23;

    fn set_interrupt_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.imr, line.into(), 1, unmasked.into());
    }

    fn set_event_mask(&self, line: u8, unmasked: bool) {
        write_field(&self.emr, line.into(), 1, unmasked.into());
    }

    fn set_edges(&self, line: u8, rising: bool, falling: bool) {
        write_field(&self.rtsr, line.into(), 1, rising.into());
        write_field(&self.ftsr, line.into(), 1, falling.into());
    }

    fn trigger(&self, line: u8) {
        self.swier.set(1 << line);
    }

    fn is_pending(&self, line: u8) -> bool {
        self.pr.get() & (1 << line) != 0
    }

    fn clear_pending(&self, line: u8) {
        // write 1 to clear
        self.pr.set(1 << line);
    }
}

#[repr(C)]
pub struct SyscfgRegisters {
    memrmp: ReadWrite<u32>,
    pmc: ReadWrite<u32>,
    exticr: [ReadWrite<u32>; 4],
}

/// Extension trait that clocks the `SYSCFG` peripheral
pub trait SysCfgExt {
    fn constrain(self, apb2: &mut APB2) -> SysCfg;
}

impl SysCfgExt for SYSCFG {
    fn constrain(self, apb2: &mut APB2) -> SysCfg {
        SYSCFG::enable(apb2);
        SysCfg { syscfg: self }
    }
}

/// Clocked system configuration controller
pub struct SysCfg {
    syscfg: SYSCFG,
}

impl SysCfg {
    pub fn free(self) -> SYSCFG {
        self.syscfg
    }
}

impl SourceSelect for SysCfg {
    fn select(&mut self, line: u8, port: u8) {
        if line < 16 {
            let regs = self.syscfg.registers();
            let line = u32::from(line);
            write_field(&regs.exticr[(line / 4) as usize], (line % 4) * 4, 4, port.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::gpio::{gpioc, Port};
    use super::super::EXTI;
    use super::*;
    use crate::exti::{Edge, Exti};
    use crate::reg::mock;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(ExtiRegisters, pr), 0x14);
        assert_eq!(offset_of!(SyscfgRegisters, exticr), 0x08);
    }

    #[test]
    fn gpio_line_setup() {
        let exti = unsafe { EXTI::at(mock::block()) };
        let regs = exti.registers();
        let syscfg = unsafe { SYSCFG::at(mock::block()) };
        let sysregs = syscfg.registers();
        let rcc = mock::block();
        let mut syscfg = syscfg.constrain(&mut APB2::new(rcc));
        assert_eq!(mock::peek(rcc, 0x44), 1 << 14);

        let gpioc = gpioc::Parts::new(Port::mock());
        let pin = gpioc.pc13.into_pull_up_input();

        let mut exti = Exti::new(exti);
        exti.listen_gpio(&pin, &mut syscfg, Edge::Falling);
        // EXTICR4, field 1, port C
        assert_eq!(mock::peek(sysregs, 0x14), 2 << 4);
        assert_eq!(mock::peek(regs, 0x00), 1 << 13);
        assert_eq!(mock::peek(regs, 0x08), 0);
        assert_eq!(mock::peek(regs, 0x0C), 1 << 13);

        exti.listen(0, Edge::RisingFalling);
        assert_eq!(mock::peek(regs, 0x08), 1);
        assert_eq!(mock::peek(regs, 0x0C), 1 << 13 | 1);

        exti.trigger(0);
        assert_eq!(mock::peek(regs, 0x10), 1);

        mock::poke(regs, 0x14, 1 << 13);
        assert!(exti.is_pending(13));
        exti.unpend(13);
        assert_eq!(mock::peek(regs, 0x14), 1 << 13);

        exti.unlisten(13);
        assert_eq!(mock::peek(regs, 0x00), 1);

        // out of range lines are ignored
        exti.listen(23, Edge::Rising);
        assert_eq!(mock::peek(regs, 0x08), 1);
        assert!(!exti.is_pending(40));
    }
}
