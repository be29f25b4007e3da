// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watchdog timer (WDT) and window watchdog timer (WWDT)
//!
//! The WDT runs from the 40 kHz LICK, the WWDT from PCLK1 / 4096.

use super::crm::LICK;
use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, WriteOnly, Writeable};
use crate::time::Hertz;
use crate::watchdog;

register_bitfields![u32,
    WDT_STS [
        RLDF OFFSET(1) NUMBITS(1) [],
        DIVF OFFSET(0) NUMBITS(1) []
    ],
    WWDT_CTRL [
        WWDTEN OFFSET(7) NUMBITS(1) [],
        CNT OFFSET(0) NUMBITS(7) []
    ],
    WWDT_CFG [
        RLDIEN OFFSET(9) NUMBITS(1) [],
        DIV OFFSET(7) NUMBITS(2) [],
        WIN OFFSET(0) NUMBITS(7) []
    ],
    WWDT_STS [
        RLDF OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct WdtRegisters {
    cmd: WriteOnly<u32>,
    div: ReadWrite<u32>,
    rld: ReadWrite<u32>,
    sts: ReadOnly<u32, WDT_STS::Register>,
}

impl watchdog::IwdgRegisters for WdtRegisters {
    const LSI: Hertz = LICK;

    fn key(&self, key: u16) {
        self.cmd.set(key.into());
    }

    fn set_timing(&self, pr: u8, rl: u16) {
        self.div.set(pr.into());
        self.rld.set(rl.into());
    }

    fn timing(&self) -> (u8, u16) {
        ((self.div.get() & 0x7) as u8, (self.rld.get() & 0xFFF) as u16)
    }

    fn updating(&self) -> bool {
        self.sts.is_set(WDT_STS::DIVF) || self.sts.is_set(WDT_STS::RLDF)
    }
}

#[repr(C)]
pub struct WwdtRegisters {
    ctrl: ReadWrite<u32, WWDT_CTRL::Register>,
    cfg: ReadWrite<u32, WWDT_CFG::Register>,
    sts: ReadWrite<u32, WWDT_STS::Register>,
}

impl watchdog::WwdgRegisters for WwdtRegisters {
    fn configure(&self, psc: u8, window: u8) {
        self.cfg.modify(WWDT_CFG::DIV.val(psc.into()) + WWDT_CFG::WIN.val(window.into()));
    }

    fn set_counter(&self, counter: u8) {
        self.ctrl.write(WWDT_CTRL::WWDTEN::SET + WWDT_CTRL::CNT.val(counter.into()));
    }

    fn counter(&self) -> u8 {
        self.ctrl.read(WWDT_CTRL::CNT) as u8
    }

    fn enable_early_wakeup(&self) {
        self.cfg.modify(WWDT_CFG::RLDIEN::SET);
    }

    fn take_early_wakeup(&self) -> bool {
        let raised = self.sts.is_set(WWDT_STS::RLDF);
        if raised {
            self.sts.set(0);
        }
        raised
    }
}

#[cfg(test)]
mod tests {
    use super::super::crm::APB1;
    use super::super::{WDT, WWDT};
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral};
    use crate::time::{MicroSeconds, MilliSeconds};
    use crate::watchdog::{IndependentWatchdog, WindowWatchdog};
    use embedded_hal::watchdog::{Watchdog, WatchdogEnable};

    #[test]
    fn wdt_runs_from_lick() {
        let wdt = unsafe { WDT::at(mock::block()) };
        let regs = wdt.registers();
        let mut wdg = IndependentWatchdog::new(wdt);
        wdg.start(MilliSeconds(1_000));
        let (pr, rl) = watchdog::IwdgRegisters::timing(&*regs);
        assert_eq!((pr, rl), watchdog::iwdg_timing(LICK, 1_000));
        assert!(watchdog::iwdg_timeout_ms(LICK, pr, rl) >= 1_000);
        wdg.feed();
        assert_eq!(mock::peek(regs, 0x00), 0xAAAA);
    }

    #[test]
    fn wwdt_reload_flag() {
        let wwdt = unsafe { WWDT::at(mock::block()) };
        let regs = wwdt.registers();
        let clocks = Clocks::new(
            Hertz(288_000_000),
            Hertz(288_000_000),
            Hertz(144_000_000),
            Hertz(144_000_000),
        );
        let crm = mock::block();
        let mut wdg = WindowWatchdog::new(wwdt, &clocks, &mut APB1::new(crm));
        assert_eq!(mock::peek(crm, 0x40), 1 << 11);
        wdg.listen();
        wdg.start(MicroSeconds(5_000));
        assert_eq!(mock::peek(regs, 0x00) & 0x80, 0x80);
        assert_eq!(mock::peek(regs, 0x04) & 1 << 9, 1 << 9);

        assert!(!wdg.is_early_wakeup());
        mock::poke(regs, 0x08, 1);
        assert!(wdg.is_early_wakeup());
        assert_eq!(mock::peek(regs, 0x08), 0);
    }
}
