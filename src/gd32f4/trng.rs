// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! True random number generator

use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::rng::{RngRegisters, Status};

register_bitfields![u32,
    CTL [
        IE OFFSET(3) NUMBITS(1) [],
        TRNGEN OFFSET(2) NUMBITS(1) []
    ],
    STAT [
        SEIF OFFSET(6) NUMBITS(1) [],
        CEIF OFFSET(5) NUMBITS(1) [],
        SECS OFFSET(2) NUMBITS(1) [],
        CECS OFFSET(1) NUMBITS(1) [],
        DRDY OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct TrngRegisters {
    ctl: ReadWrite<u32, CTL::Register>,
    stat: ReadWrite<u32, STAT::Register>,
    data: ReadOnly<u32>,
}

impl RngRegisters for TrngRegisters {
    fn enable(&self) {
        self.ctl.modify(CTL::TRNGEN::SET);
    }

    fn disable(&self) {
        self.ctl.modify(CTL::TRNGEN::CLEAR);
    }

    fn status(&self) -> Status {
        let stat = self.stat.extract();
        Status {
            ready: stat.is_set(STAT::DRDY),
            clock_error: stat.is_set(STAT::CECS) || stat.is_set(STAT::CEIF),
            seed_error: stat.is_set(STAT::SECS) || stat.is_set(STAT::SEIF),
        }
    }

    fn recover(&self) {
        let seed_error = self.stat.is_set(STAT::SECS);
        self.stat.modify(STAT::SEIF::CLEAR + STAT::CEIF::CLEAR);
        if seed_error {
            self.disable();
            self.enable();
        }
    }

    fn data(&self) -> u32 {
        self.data.get()
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcu::AHB2;
    use super::super::TRNG;
    use super::*;
    use crate::reg::{mock, Peripheral};
    use crate::rng::{Error, Rng};

    #[test]
    fn seed_error_restarts_the_generator() {
        let token = unsafe { TRNG::at(mock::block()) };
        let regs = token.registers();
        let rcu = mock::block();
        let mut rng = Rng::new(token, &mut AHB2::new(rcu));
        assert_eq!(mock::peek(rcu, 0x34), 1 << 6);

        mock::poke(regs, 0x04, 1 << 2);
        assert_eq!(rng.read(), Err(nb::Error::Other(Error::SeedError)));
        assert_eq!(mock::peek(regs, 0x00), 1 << 2);

        mock::poke(regs, 0x04, 1);
        mock::poke(regs, 0x08, 0xCAFE_F00D);
        assert_eq!(rng.read(), Ok(0xCAFE_F00D));
    }
}
