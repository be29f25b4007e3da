// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC calculation unit

use super::CRC;
use crate::crc::{self, Crc};
use crate::reg::{register_bitfields, Peripheral, ReadWrite, Readable, Writeable};

register_bitfields![u32,
    CTL [
        RST OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct CrcRegisters {
    data: ReadWrite<u32>,
    fdata: ReadWrite<u32>,
    ctl: ReadWrite<u32, CTL::Register>,
}

impl crc::CrcRegisters for CrcRegisters {
    fn reset(&self) {
        self.ctl.write(CTL::RST::SET);
    }

    fn write(&self, word: u32) {
        self.data.set(word);
    }

    fn result(&self) -> u32 {
        self.data.get()
    }
}

impl Crc<CRC> {
    /// Reads the free data register
    pub fn fdata(&self) -> u8 {
        self.token().registers().fdata.get() as u8
    }

    /// Writes the free data register, which CRC resets leave alone
    pub fn set_fdata(&mut self, value: u8) {
        self.token().registers().fdata.set(value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::super::rcu::AHB1;
    use super::*;
    use crate::reg::mock;

    #[test]
    fn free_data_survives_reset() {
        let token = unsafe { CRC::at(mock::block()) };
        let regs = token.registers();
        let mut crc = Crc::new(token, &mut AHB1::new(mock::block()));
        crc.set_fdata(0xA5);
        crc.reset();
        assert_eq!(crc.fdata(), 0xA5);
        assert_eq!(mock::peek(regs, 0x08), 1);
        crc.write(0x1234);
        assert_eq!(crc.read(), 0x1234);
    }
}
