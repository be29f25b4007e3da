// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random number generator registers
//!
//! The RNG is clocked by the PLL48 output; [`freeze`](super::rcc::CFGR::freeze)
//! sets it as close to 48 MHz as the VCO allows.

use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::rng::{self, Status};

register_bitfields![u32,
    CR [
        IE OFFSET(3) NUMBITS(1) [],
        RNGEN OFFSET(2) NUMBITS(1) []
    ],
    SR [
        SEIS OFFSET(6) NUMBITS(1) [],
        CEIS OFFSET(5) NUMBITS(1) [],
        SECS OFFSET(2) NUMBITS(1) [],
        CECS OFFSET(1) NUMBITS(1) [],
        DRDY OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct RngRegisters {
    cr: ReadWrite<u32, CR::Register>,
    sr: ReadWrite<u32, SR::Register>,
    dr: ReadOnly<u32>,
}

impl rng::RngRegisters for RngRegisters {
    fn enable(&self) {
        self.cr.modify(CR::RNGEN::SET);
    }

    fn disable(&self) {
        self.cr.modify(CR::RNGEN::CLEAR);
    }

    fn status(&self) -> Status {
        let sr = self.sr.extract();
        Status {
            ready: sr.is_set(SR::DRDY),
            clock_error: sr.is_set(SR::CECS) || sr.is_set(SR::CEIS),
            seed_error: sr.is_set(SR::SECS) || sr.is_set(SR::SEIS),
        }
    }

    fn recover(&self) {
        self.sr.modify(SR::SEIS::CLEAR + SR::CEIS::CLEAR);
        if self.sr.is_set(SR::SECS) {
            // a seed error needs the generator restarted
            self.cr.modify(CR::RNGEN::CLEAR);
            self.cr.modify(CR::RNGEN::SET);
        }
    }

    #[inline(always)]
    fn data(&self) -> u32 {
        self.dr.get()
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcc::AHB2;
    use super::super::RNG;
    use super::*;
    use crate::reg::{mock, Peripheral};
    use crate::rng::{Error, Rng};
    use embedded_hal::blocking::rng::Read;

    #[test]
    fn words_and_errors() {
        let token = unsafe { RNG::at(mock::block()) };
        let regs = token.registers();
        let rcc = mock::block();
        let mut ahb2 = AHB2::new(rcc);

        let mut rng = Rng::new(token, &mut ahb2);
        assert_eq!(mock::peek(rcc, 0x34), 1 << 6);
        assert_eq!(mock::peek(regs, 0x00), 1 << 2);

        assert_eq!(rng.read(), Err(nb::Error::WouldBlock));
        mock::poke(regs, 0x08, 0x1234_5678);
        mock::poke(regs, 0x04, 1);
        assert_eq!(rng.read(), Ok(0x1234_5678));

        let mut bytes = [0u8; 6];
        Read::read(&mut rng, &mut bytes).unwrap();
        assert_eq!(bytes, [0x78, 0x56, 0x34, 0x12, 0x78, 0x56]);

        mock::poke(regs, 0x04, 1 << 6 | 1 << 2);
        assert_eq!(rng.read(), Err(nb::Error::Other(Error::SeedError)));
        assert_eq!(mock::peek(regs, 0x04), 1 << 2);

        mock::poke(regs, 0x04, 1 << 5);
        assert_eq!(rng.read(), Err(nb::Error::Other(Error::ClockError)));
        assert_eq!(mock::peek(regs, 0x04), 0);

        let _token = rng.release();
        assert_eq!(mock::peek(regs, 0x00), 0);
    }
}
