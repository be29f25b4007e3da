// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC calculation unit
//!
//! Besides the F4 feature set the AT32 unit takes a programmable initial
//! value and can bit-reverse its input and output.

use super::CRC;
use crate::crc::{self, Crc};
use crate::reg::{register_bitfields, Peripheral, ReadWrite, ReadWriteable, Readable, Writeable};

register_bitfields![u32,
    CTRL [
        REVOD OFFSET(7) NUMBITS(1) [],
        REVID OFFSET(5) NUMBITS(2) [
            None = 0,
            Byte = 1,
            HalfWord = 2,
            Word = 3
        ],
        RST OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct CrcRegisters {
    dt: ReadWrite<u32>,
    cdt: ReadWrite<u32>,
    ctrl: ReadWrite<u32, CTRL::Register>,
    _reserved0: [u8; 4],
    idt: ReadWrite<u32>,
}

impl crc::CrcRegisters for CrcRegisters {
    // keeps the reverse settings
    fn reset(&self) {
        self.ctrl.modify(CTRL::RST::SET);
    }

    fn write(&self, word: u32) {
        self.dt.set(word);
    }

    fn result(&self) -> u32 {
        self.dt.get()
    }
}

/// Granularity of the input bit reversal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputReverse {
    None,
    Byte,
    HalfWord,
    Word,
}

impl Crc<CRC> {
    /// Sets the value loaded by [`Crc::reset`], `0xFFFF_FFFF` out of reset
    pub fn set_initial(&mut self, value: u32) {
        self.token().registers().idt.set(value);
    }

    /// Reverses the bits of each input word in `reverse` sized groups
    pub fn set_input_reverse(&mut self, reverse: InputReverse) {
        let revid = match reverse {
            InputReverse::None => CTRL::REVID::None,
            InputReverse::Byte => CTRL::REVID::Byte,
            InputReverse::HalfWord => CTRL::REVID::HalfWord,
            InputReverse::Word => CTRL::REVID::Word,
        };
        self.token().registers().ctrl.modify(revid);
    }

    /// Bit-reverses the result
    pub fn set_output_reverse(&mut self, reverse: bool) {
        self.token().registers().ctrl.modify(CTRL::REVOD.val(reverse.into()));
    }

    /// Reads the common data register
    pub fn common_data(&self) -> u8 {
        self.token().registers().cdt.get() as u8
    }

    /// Stores a byte that survives resets of the accumulator
    pub fn set_common_data(&mut self, value: u8) {
        self.token().registers().cdt.set(value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::super::crm::AHB1;
    use super::*;
    use crate::reg::mock;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(CrcRegisters, ctrl), 0x08);
        assert_eq!(offset_of!(CrcRegisters, idt), 0x10);
    }

    #[test]
    fn reflected_crc32_setup() {
        let token = unsafe { CRC::at(mock::block()) };
        let regs = token.registers();
        let ahb1 = mock::block();
        let mut crc = Crc::new(token, &mut AHB1::new(ahb1));
        assert_eq!(mock::peek(ahb1, 0x30), 1 << 12);

        crc.set_initial(0xFFFF_FFFF);
        crc.set_input_reverse(InputReverse::Word);
        crc.set_output_reverse(true);
        assert_eq!(mock::peek(regs, 0x10), 0xFFFF_FFFF);
        assert_eq!(mock::peek(regs, 0x08), 1 | 3 << 5 | 1 << 7);

        crc.reset();
        assert_eq!(mock::peek(regs, 0x08), 1 | 3 << 5 | 1 << 7);
        crc.set_input_reverse(InputReverse::None);
        assert_eq!(mock::peek(regs, 0x08) & 3 << 5, 0);

        crc.set_common_data(0x3C);
        assert_eq!(crc.common_data(), 0x3C);
    }
}
