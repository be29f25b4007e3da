// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Special watchdog timer (SWDT)
//!
//! Period, clock divider, refresh window and the action on underflow are
//! fixed at reset by the ICG words in flash. Software can only refresh the
//! counter and read or clear the flags.

use embedded_hal::watchdog::Watchdog;

use super::SWDT;
use crate::reg::{register_bitfields, Peripheral, ReadWrite, Readable, WriteOnly, Writeable};

/// First refresh key
pub const KEY_REFRESH_0: u32 = 0x0123;
/// Second refresh key
pub const KEY_REFRESH_1: u32 = 0x3210;

register_bitfields![u32,
    SR [
        REF OFFSET(17) NUMBITS(1) [],
        UDF OFFSET(16) NUMBITS(1) [],
        CNT OFFSET(0) NUMBITS(16) []
    ]
];

#[repr(C)]
pub struct SwdtRegisters {
    _reserved0: [u8; 4],
    sr: ReadWrite<u32, SR::Register>,
    rr: WriteOnly<u32>,
}

/// Flags latched by the watchdog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags {
    /// The counter ran out
    pub underflow: bool,
    /// A refresh landed outside the allowed window
    pub refresh_error: bool,
}

/// Wraps the SWDT
pub struct SoftwareWatchdog {
    wdg: SWDT,
}

impl SoftwareWatchdog {
    /// Wraps the watchdog; the option bytes already started it
    pub fn new(wdg: SWDT) -> Self {
        SoftwareWatchdog { wdg }
    }

    /// Current counter value
    pub fn counter(&self) -> u16 {
        self.wdg.registers().sr.read(SR::CNT) as u16
    }

    /// Reads the underflow and refresh error flags
    pub fn flags(&self) -> Flags {
        let sr = self.wdg.registers().sr.extract();
        Flags {
            underflow: sr.is_set(SR::UDF),
            refresh_error: sr.is_set(SR::REF),
        }
    }

    /// Clears both flags, they are written with zero
    pub fn clear_flags(&mut self) {
        self.wdg.registers().sr.write(SR::UDF::CLEAR + SR::REF::CLEAR);
    }

    pub fn free(self) -> SWDT {
        self.wdg
    }
}

impl Watchdog for SoftwareWatchdog {
    /// Also starts the counter when the ICG selects software start
    fn feed(&mut self) {
        let regs = self.wdg.registers();
        regs.rr.set(KEY_REFRESH_0);
        regs.rr.set(KEY_REFRESH_1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::mock;

    #[test]
    fn refresh_and_flags() {
        let token = unsafe { SWDT::at(mock::block()) };
        let regs = token.registers();
        let mut wdg = SoftwareWatchdog::new(token);

        wdg.feed();
        assert_eq!(mock::peek(regs, 0x08), KEY_REFRESH_1);

        mock::poke(regs, 0x04, 1 << 17 | 0x0FFF);
        assert_eq!(wdg.counter(), 0x0FFF);
        assert_eq!(
            wdg.flags(),
            Flags {
                underflow: false,
                refresh_error: true,
            }
        );
        wdg.clear_flags();
        assert_eq!(wdg.flags(), Flags::default());
    }
}
