// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC16/CRC32 unit
//!
//! Writing the result register loads the initial value. CRC16 uses the
//! CCITT polynomial `0x1021`, CRC32 the IEEE one; both reflect input and
//! output and invert the result unless told otherwise.

use super::CRC;
use crate::crc::{self, Crc};
use crate::reg::{register_bitfields, Peripheral, ReadOnly, ReadWrite, ReadWriteable, Readable, WriteOnly, Writeable};

register_bitfields![u32,
    CR [
        XOROUT OFFSET(4) NUMBITS(1) [],
        REFOUT OFFSET(3) NUMBITS(1) [],
        REFIN OFFSET(2) NUMBITS(1) [],
        CR_SEL OFFSET(1) NUMBITS(1) [
            Crc16 = 0,
            Crc32 = 1
        ]
    ]
];

#[repr(C)]
pub struct CrcRegisters {
    cr: ReadWrite<u32, CR::Register>,
    reslt: ReadWrite<u32>,
    _reserved0: [u8; 4],
    flg: ReadOnly<u32>,
    _reserved1: [u8; 0x70],
    dat: WriteOnly<u32>,
}

/// Value loaded by `reset`
pub const INITIAL: u32 = 0xFFFF_FFFF;

impl crc::CrcRegisters for CrcRegisters {
    fn reset(&self) {
        self.reslt.set(INITIAL);
    }

    fn write(&self, word: u32) {
        self.dat.set(word);
    }

    fn result(&self) -> u32 {
        match self.cr.read_as_enum(CR::CR_SEL) {
            Some(CR::CR_SEL::Value::Crc16) => self.reslt.get() & 0xFFFF,
            _ => self.reslt.get(),
        }
    }
}

/// Polynomial width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Crc16,
    Crc32,
}

impl Crc<CRC> {
    /// Selects the polynomial and reloads the initial value
    pub fn set_width(&mut self, width: Width) {
        let regs = self.token().registers();
        regs.cr.modify(match width {
            Width::Crc16 => CR::CR_SEL::Crc16,
            Width::Crc32 => CR::CR_SEL::Crc32,
        });
        regs.reslt.set(INITIAL);
    }

    /// Bit-reverses the input words and the result
    pub fn set_reflection(&mut self, input: bool, output: bool) {
        self.token()
            .registers()
            .cr
            .modify(CR::REFIN.val(input.into()) + CR::REFOUT.val(output.into()));
    }

    /// Inverts the result on read
    pub fn set_xor_out(&mut self, xor: bool) {
        self.token().registers().cr.modify(CR::XOROUT.val(xor.into()));
    }

    /// Feeds `words` followed by their expected checksum and reports whether
    /// the unit accepted it
    pub fn check(&mut self, words: &[u32], expected: u32) -> bool {
        self.checksum(words);
        let regs = self.token().registers();
        regs.dat.set(expected);
        regs.flg.get() & 1 != 0
    }
}
