// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! True random number generator
//!
//! Each run shifts the ring oscillators into a 64-bit result and clears
//! `RUN` when done. The unit has no health checks, so neither error is
//! ever reported.

use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::rng::{RngRegisters, Status};

register_bitfields![u32,
    CR [
        RUN OFFSET(1) NUMBITS(1) [],
        EN OFFSET(0) NUMBITS(1) []
    ],
    MR [
        CNT OFFSET(2) NUMBITS(3) [
            Shift32 = 3,
            Shift64 = 4,
            Shift128 = 5,
            Shift256 = 6
        ],
        LOAD OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct TrngRegisters {
    cr: ReadWrite<u32, CR::Register>,
    mr: ReadWrite<u32, MR::Register>,
    _reserved0: [u8; 4],
    dr0: ReadOnly<u32>,
    dr1: ReadOnly<u32>,
}

impl RngRegisters for TrngRegisters {
    fn enable(&self) {
        self.mr.write(MR::CNT::Shift64 + MR::LOAD::SET);
        self.cr.write(CR::EN::SET + CR::RUN::SET);
    }

    fn disable(&self) {
        self.cr.set(0);
    }

    fn status(&self) -> Status {
        Status {
            ready: self.cr.is_set(CR::EN) && !self.cr.is_set(CR::RUN),
            ..Status::default()
        }
    }

    fn recover(&self) {}

    // the upper half is dropped, the next run reseeds both
    fn data(&self) -> u32 {
        let word = self.dr0.get();
        self.cr.modify(CR::RUN::SET);
        word
    }
}

impl TrngRegisters {
    /// Upper half of the last result
    pub fn high_word(&self) -> u32 {
        self.dr1.get()
    }
}

#[cfg(test)]
mod tests {
    use super::super::cmu::FCG0;
    use super::super::TRNG;
    use super::*;
    use crate::reg::{mock, Peripheral};
    use crate::rng::Rng;

    #[test]
    fn waits_for_the_run_to_finish() {
        let token = unsafe { TRNG::at(mock::block()) };
        let regs = token.registers();
        let fcg = mock::block();
        mock::poke(fcg, 0x00, u32::MAX);
        let mut rng = Rng::new(token, &mut FCG0::new(fcg));
        assert_eq!(mock::peek(fcg, 0x00), !(1 << 22));
        assert_eq!(mock::peek(regs, 0x04), 4 << 2 | 1);
        assert_eq!(mock::peek(regs, 0x00), 0b11);

        assert_eq!(rng.read(), Err(nb::Error::WouldBlock));

        mock::poke(regs, 0x00, 0b01);
        mock::poke(regs, 0x0C, 0x1234_5678);
        mock::poke(regs, 0x10, 0x9ABC_DEF0);
        assert_eq!(rng.read(), Ok(0x1234_5678));
        assert_eq!(regs.high_word(), 0x9ABC_DEF0);
        // next run started
        assert_eq!(mock::peek(regs, 0x00), 0b11);
    }
}
