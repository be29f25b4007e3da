// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! True random number generator

use crate::clocks::Enable;
use crate::reg::Peripheral;

/// RNG error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The RNG clock is too slow or stopped
    ClockError,
    /// The entropy source failed its health check
    SeedError,
}

/// Snapshot of the RNG status flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub ready: bool,
    pub clock_error: bool,
    pub seed_error: bool,
}

/// Register access to an RNG, implemented by each family
pub trait RngRegisters {
    /// Starts the entropy source
    fn enable(&self);

    /// Stops the entropy source
    fn disable(&self);

    /// Reads the ready and error flags
    fn status(&self) -> Status;

    /// Clears the error flags and restarts generation after a seed error
    fn recover(&self);

    /// Takes the next 32-bit word
    fn data(&self) -> u32;
}

/// Wraps a true random number generator
pub struct Rng<RNG> {
    rng: RNG,
}

impl<RNG> Rng<RNG>
where
    RNG: Peripheral + Enable,
    RNG::Registers: RngRegisters,
{
    /// Enables the RNG clock and starts generation
    pub fn new(rng: RNG, bus: &mut RNG::Bus) -> Self {
        RNG::enable(bus);
        rng.registers().enable();
        Rng { rng }
    }

    /// Stops generation and returns the token
    pub fn release(self) -> RNG {
        self.rng.registers().disable();
        self.rng
    }

    /// Returns a random word once one is available
    pub fn read(&mut self) -> nb::Result<u32, Error> {
        let regs = self.rng.registers();
        let status = regs.status();
        if status.seed_error {
            regs.recover();
            Err(nb::Error::Other(Error::SeedError))
        } else if status.clock_error {
            regs.recover();
            Err(nb::Error::Other(Error::ClockError))
        } else if status.ready {
            Ok(regs.data())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<RNG> embedded_hal::blocking::rng::Read for Rng<RNG>
where
    RNG: Peripheral + Enable,
    RNG::Registers: RngRegisters,
{
    type Error = Error;

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        for chunk in buffer.chunks_mut(4) {
            let word = nb::block!(Rng::read(self))?;
            chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        }
        Ok(())
    }
}
