// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Independent (IWDG) and window (WWDG) watchdog registers

use super::rcc::LSI;
use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, WriteOnly, Writeable};
use crate::time::Hertz;
use crate::watchdog;

register_bitfields![u32,
    SR [
        RVU OFFSET(1) NUMBITS(1) [],
        PVU OFFSET(0) NUMBITS(1) []
    ],
    CR [
        WDGA OFFSET(7) NUMBITS(1) [],
        T OFFSET(0) NUMBITS(7) []
    ],
    CFR [
        EWI OFFSET(9) NUMBITS(1) [],
        WDGTB OFFSET(7) NUMBITS(2) [],
        W OFFSET(0) NUMBITS(7) []
    ],
    WWDG_SR [
        EWIF OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct IwdgRegisters {
    kr: WriteOnly<u32>,
    pr: ReadWrite<u32>,
    rlr: ReadWrite<u32>,
    sr: ReadOnly<u32, SR::Register>,
}

impl watchdog::IwdgRegisters for IwdgRegisters {
    const LSI: Hertz = LSI;

    #[inline(always)]
    fn key(&self, key: u16) {
        self.kr.set(u32::from(key));
    }

    fn set_timing(&self, pr: u8, rl: u16) {
        self.pr.set(u32::from(pr));
        self.rlr.set(u32::from(rl));
    }

    fn timing(&self) -> (u8, u16) {
        ((self.pr.get() & 0b111) as u8, (self.rlr.get() & 0x0FFF) as u16)
    }

    fn updating(&self) -> bool {
        self.sr.is_set(SR::PVU) || self.sr.is_set(SR::RVU)
    }
}

#[repr(C)]
pub struct WwdgRegisters {
    cr: ReadWrite<u32, CR::Register>,
    cfr: ReadWrite<u32, CFR::Register>,
    sr: ReadWrite<u32, WWDG_SR::Register>,
}

impl watchdog::WwdgRegisters for WwdgRegisters {
    fn configure(&self, psc: u8, window: u8) {
        self.cfr.modify(CFR::WDGTB.val(psc.into()) + CFR::W.val(window.into()));
    }

    fn set_counter(&self, counter: u8) {
        // WDGA is set-only; writing it again is harmless
        self.cr.write(CR::WDGA::SET + CR::T.val(counter.into()));
    }

    fn counter(&self) -> u8 {
        self.cr.read(CR::T) as u8
    }

    fn enable_early_wakeup(&self) {
        self.cfr.modify(CFR::EWI::SET);
    }

    fn take_early_wakeup(&self) -> bool {
        let flagged = self.sr.is_set(WWDG_SR::EWIF);
        if flagged {
            self.sr.set(0);
        }
        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcc::APB1;
    use super::super::{IWDG, WWDG};
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral, Timeout};
    use crate::time::{MicroSeconds, MilliSeconds};
    use crate::watchdog::{IndependentWatchdog, WindowWatchdog};
    use embedded_hal::watchdog::{Watchdog, WatchdogEnable};

    #[test]
    fn independent_watchdog_start_and_feed() {
        let iwdg = unsafe { IWDG::at(mock::block()) };
        let regs = iwdg.registers();
        let mut wdg = IndependentWatchdog::new(iwdg);

        assert_eq!(wdg.try_start(MilliSeconds(1_000)), Ok(()));
        assert_eq!(mock::peek(regs, 0x04), 1);
        assert_eq!(mock::peek(regs, 0x08), 3_999);
        assert_eq!(mock::peek(regs, 0x00), 0xAAAA);
        assert_eq!(wdg.interval(), MilliSeconds(1_000));

        mock::poke(regs, 0x00, 0);
        wdg.feed();
        assert_eq!(mock::peek(regs, 0x00), 0xAAAA);
    }

    #[test]
    fn independent_watchdog_stuck_update() {
        let iwdg = unsafe { IWDG::at(mock::block()) };
        let regs = iwdg.registers();
        mock::poke(regs, 0x0C, 0b01);
        let mut wdg = IndependentWatchdog::new(iwdg);
        assert_eq!(wdg.try_start(MilliSeconds(100)), Err(Timeout));
        // still fed, so the old reload applies
        assert_eq!(mock::peek(regs, 0x00), 0xAAAA);
    }

    #[test]
    fn window_watchdog_start_and_feed() {
        let wwdg = unsafe { WWDG::at(mock::block()) };
        let regs = wwdg.registers();
        let clocks = Clocks::new(
            Hertz(168_000_000),
            Hertz(168_000_000),
            Hertz(42_000_000),
            Hertz(84_000_000),
        );
        let rcc = mock::block();
        let mut apb1 = APB1::new(rcc);

        let mut wdg = WindowWatchdog::new(wwdg, &clocks, &mut apb1);
        assert_eq!(mock::peek(rcc, 0x40), 1 << 11);

        wdg.set_window(0x50);
        wdg.start(MicroSeconds(40_000));
        assert_eq!(mock::peek(regs, 0x04), 3 << 7 | 0x50);
        assert_eq!(mock::peek(regs, 0x00), 1 << 7 | 0x40 | 51);

        mock::poke(regs, 0x00, 0x80 | 0x45);
        wdg.feed();
        assert_eq!(mock::peek(regs, 0x00), 1 << 7 | 0x40 | 51);

        wdg.listen();
        assert_eq!(mock::peek(regs, 0x04) & 1 << 9, 1 << 9);
        assert!(!wdg.is_early_wakeup());
        mock::poke(regs, 0x08, 1);
        assert!(wdg.is_early_wakeup());
        assert_eq!(mock::peek(regs, 0x08), 0);
    }

    #[test]
    fn window_watchdog_short_timeouts_use_the_shortest() {
        let wwdg = unsafe { WWDG::at(mock::block()) };
        let regs = wwdg.registers();
        let clocks = Clocks::new(
            Hertz(168_000_000),
            Hertz(168_000_000),
            Hertz(42_000_000),
            Hertz(84_000_000),
        );
        let mut wdg = WindowWatchdog::new(wwdg, &clocks, &mut APB1::new(mock::block()));

        wdg.start(MicroSeconds(0));
        assert_eq!(mock::peek(regs, 0x04) & 3 << 7, 0);
        assert_eq!(mock::peek(regs, 0x00), 1 << 7 | 0x40);

        // beyond 50 ms at 42 MHz
        wdg.start(MicroSeconds(1_000_000));
        assert_eq!(mock::peek(regs, 0x04) & 3 << 7, 3 << 7);
        assert_eq!(mock::peek(regs, 0x00), 1 << 7 | 0x7F);
    }
}
