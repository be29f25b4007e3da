// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC-32 (Ethernet polynomial `0x04C1_1DB7`, initial value `0xFFFF_FFFF`)

use super::CRC;
use crate::crc::{self, Crc};
use crate::reg::{register_bitfields, Peripheral, ReadWrite, Readable, Writeable};

register_bitfields![u32,
    CR [
        RESET OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct CrcRegisters {
    dr: ReadWrite<u32>,
    idr: ReadWrite<u32>,
    cr: ReadWrite<u32, CR::Register>,
}

impl crc::CrcRegisters for CrcRegisters {
    fn reset(&self) {
        self.cr.write(CR::RESET::SET);
    }

    #[inline(always)]
    fn write(&self, word: u32) {
        self.dr.set(word);
    }

    #[inline(always)]
    fn result(&self) -> u32 {
        self.dr.get()
    }
}

impl Crc<CRC> {
    /// Reads the general purpose independent data byte
    pub fn idr(&self) -> u8 {
        self.token().registers().idr.get() as u8
    }

    /// Stores a byte that survives CRC resets
    pub fn set_idr(&mut self, value: u8) {
        self.token().registers().idr.set(u32::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcc::AHB1;
    use super::*;
    use crate::reg::mock;

    #[test]
    fn checksum_resets_first() {
        let token = unsafe { CRC::at(mock::block()) };
        let regs = token.registers();
        let rcc = mock::block();
        let mut ahb1 = AHB1::new(rcc);

        let mut crc = Crc::new(token, &mut ahb1);
        assert_eq!(mock::peek(rcc, 0x30), 1 << 12);
        assert_eq!(mock::peek(regs, 0x08), 1);

        mock::poke(regs, 0x08, 0);
        // the mock data register just holds the last word
        assert_eq!(crc.checksum(&[1, 2, 0xC704_DD7B]), 0xC704_DD7B);
        assert_eq!(mock::peek(regs, 0x08), 1);

        crc.set_idr(0x5A);
        assert_eq!(crc.idr(), 0x5A);
    }
}
