// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free watchdog timer (FWDGT) and window watchdog timer (WWDGT)

use super::rcu::IRC32K;
use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, WriteOnly, Writeable};
use crate::time::Hertz;
use crate::watchdog;

register_bitfields![u32,
    FWDGT_STAT [
        RUD OFFSET(1) NUMBITS(1) [],
        PUD OFFSET(0) NUMBITS(1) []
    ],
    WWDGT_CTL [
        WDGTEN OFFSET(7) NUMBITS(1) [],
        CNT OFFSET(0) NUMBITS(7) []
    ],
    WWDGT_CFG [
        EWIE OFFSET(9) NUMBITS(1) [],
        PSC OFFSET(7) NUMBITS(2) [],
        WIN OFFSET(0) NUMBITS(7) []
    ],
    WWDGT_STAT [
        EWIF OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct FwdgtRegisters {
    ctl: WriteOnly<u32>,
    psc: ReadWrite<u32>,
    rld: ReadWrite<u32>,
    stat: ReadOnly<u32, FWDGT_STAT::Register>,
}

impl watchdog::IwdgRegisters for FwdgtRegisters {
    const LSI: Hertz = IRC32K;

    fn key(&self, key: u16) {
        self.ctl.set(key.into());
    }

    fn set_timing(&self, pr: u8, rl: u16) {
        self.psc.set(pr.into());
        self.rld.set(rl.into());
    }

    fn timing(&self) -> (u8, u16) {
        ((self.psc.get() & 0x7) as u8, (self.rld.get() & 0xFFF) as u16)
    }

    fn updating(&self) -> bool {
        self.stat.any_matching_bits_set(FWDGT_STAT::PUD::SET + FWDGT_STAT::RUD::SET)
    }
}

#[repr(C)]
pub struct WwdgtRegisters {
    ctl: ReadWrite<u32, WWDGT_CTL::Register>,
    cfg: ReadWrite<u32, WWDGT_CFG::Register>,
    stat: ReadWrite<u32, WWDGT_STAT::Register>,
}

impl watchdog::WwdgRegisters for WwdgtRegisters {
    fn configure(&self, psc: u8, window: u8) {
        self.cfg.modify(WWDGT_CFG::PSC.val(psc.into()) + WWDGT_CFG::WIN.val(window.into()));
    }

    fn set_counter(&self, counter: u8) {
        self.ctl.write(WWDGT_CTL::WDGTEN::SET + WWDGT_CTL::CNT.val(counter.into()));
    }

    fn counter(&self) -> u8 {
        self.ctl.read(WWDGT_CTL::CNT) as u8
    }

    fn enable_early_wakeup(&self) {
        self.cfg.modify(WWDGT_CFG::EWIE::SET);
    }

    fn take_early_wakeup(&self) -> bool {
        if self.stat.is_set(WWDGT_STAT::EWIF) {
            self.stat.write(WWDGT_STAT::EWIF::CLEAR);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcu::APB1;
    use super::super::{FWDGT, WWDGT};
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral};
    use crate::time::{MicroSeconds, MilliSeconds};
    use crate::watchdog::{IndependentWatchdog, WindowWatchdog};
    use embedded_hal::watchdog::WatchdogEnable;

    #[test]
    fn fwdgt_timing() {
        let fwdgt = unsafe { FWDGT::at(mock::block()) };
        let regs = fwdgt.registers();
        let mut wdg = IndependentWatchdog::new(fwdgt);
        wdg.start(MilliSeconds(4_000));
        // 32 kHz / 32 counts 1000 per second
        assert_eq!(mock::peek(regs, 0x04), 3);
        assert_eq!(mock::peek(regs, 0x08), 3_999);
        assert_eq!(wdg.interval(), MilliSeconds(4_000));
    }

    #[test]
    fn wwdgt_counter() {
        let wwdgt = unsafe { WWDGT::at(mock::block()) };
        let regs = wwdgt.registers();
        let clocks = Clocks::new(
            Hertz(200_000_000),
            Hertz(200_000_000),
            Hertz(50_000_000),
            Hertz(100_000_000),
        );
        let mut wdg = WindowWatchdog::new(wwdgt, &clocks, &mut APB1::new(mock::block()));
        wdg.start(MicroSeconds(10_000));
        // 50 MHz: one tick at /2 is 163.84 us, 10 ms needs 62 of them
        assert_eq!(mock::peek(regs, 0x04) >> 7 & 0b11, 1);
        assert_eq!(mock::peek(regs, 0x00), 0x80 | 0x40 | 61);
        assert_eq!(watchdog::WwdgRegisters::counter(&*regs), 0x40 | 61);
    }
}
