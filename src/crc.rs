// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC calculation unit

use crate::clocks::Enable;
use crate::reg::Peripheral;

/// Register access to a CRC unit, implemented by each family
pub trait CrcRegisters {
    /// Loads the initial value into the accumulator
    fn reset(&self);

    /// Feeds a 32-bit word into the calculation
    fn write(&self, word: u32);

    /// Reads the accumulated checksum
    fn result(&self) -> u32;
}

/// Wraps a CRC unit
pub struct Crc<CRC> {
    crc: CRC,
}

impl<CRC> Crc<CRC>
where
    CRC: Peripheral + Enable,
    CRC::Registers: CrcRegisters,
{
    /// Enables the CRC clock and resets the accumulator
    pub fn new(crc: CRC, bus: &mut CRC::Bus) -> Self {
        CRC::enable(bus);
        crc.registers().reset();
        Crc { crc }
    }

    /// Returns the token, leaving the clock running
    pub fn free(self) -> CRC {
        self.crc
    }
}

impl<CRC> Crc<CRC>
where
    CRC: Peripheral,
    CRC::Registers: CrcRegisters,
{
    /// Loads the initial value into the accumulator
    pub fn reset(&mut self) {
        self.crc.registers().reset()
    }

    /// Feeds one word
    pub fn write(&mut self, word: u32) {
        self.crc.registers().write(word)
    }

    /// Reads the checksum of everything fed since the last reset
    pub fn read(&self) -> u32 {
        self.crc.registers().result()
    }

    /// Resets the unit, feeds `words` and returns their checksum
    pub fn checksum(&mut self, words: &[u32]) -> u32 {
        self.reset();
        words.iter().for_each(|&w| self.write(w));
        self.read()
    }

    pub(crate) fn token(&self) -> &CRC {
        &self.crc
    }
}
