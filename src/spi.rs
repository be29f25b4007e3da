// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Peripheral Interface
//!
//! Full-duplex master with 8-bit frames and software slave select, for the
//! AT32, GD32 and STM32 families.
//!
//! ```rust,ignore
//! let sck = gpioa.pa5.into_alternate::<5>();
//! let miso = gpioa.pa6.into_alternate::<5>();
//! let mosi = gpioa.pa7.into_alternate::<5>();
//! let mut spi = Spi::new(dp.SPI1, (sck, miso, mosi), MODE_0, 1.mhz(), &clocks, &mut rcc.apb2);
//! let mut buf = [0x9f, 0, 0, 0];
//! spi.transfer(&mut buf)?;
//! ```

use core::marker::PhantomData;

pub use embedded_hal::spi::{FullDuplex, Mode, Phase, Polarity, MODE_0, MODE_1, MODE_2, MODE_3};

use crate::clocks::{smallest_div, BusClock, Clocks, Enable};
use crate::gpio::NoPin;
use crate::reg::{Peripheral, StaticRef};
use crate::time::Hertz;

/// SPI error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Overrun occurred
    Overrun,
    /// Mode fault occurred
    ModeFault,
    /// CRC error
    Crc,
}

/// Interrupt event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// New data has been received
    Rxne,
    /// Data can be sent
    Txe,
    /// An error occurred
    Error,
}

/// Snapshot of the SPI status flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub rxne: bool,
    pub txe: bool,
    pub crc_error: bool,
    pub mode_fault: bool,
    pub overrun: bool,
    pub busy: bool,
}

impl Status {
    /// The error to report for this status, if any
    pub fn error(&self) -> Option<Error> {
        if self.overrun {
            Some(Error::Overrun)
        } else if self.mode_fault {
            Some(Error::ModeFault)
        } else if self.crc_error {
            Some(Error::Crc)
        } else {
            None
        }
    }
}

const DIVIDERS: [u32; 8] = [2, 4, 8, 16, 32, 64, 128, 256];

/// Baud rate control bits for the fastest SCK not above `freq`
///
/// Requests below `pclk / 256` get the slowest rate.
pub fn baud_rate_bits(pclk: Hertz, freq: Hertz) -> u8 {
    let div = smallest_div(&DIVIDERS, pclk.0, freq.0).unwrap_or(256);
    div.trailing_zeros() as u8 - 1
}

/// Register access to one SPI, implemented by each family
pub trait SpiRegisters {
    /// Configures master mode with software slave select and enables the SPI
    fn configure(&self, mode: Mode, br: u8);

    /// Disables the SPI
    fn disable(&self);

    /// Reads the status flags
    fn status(&self) -> Status;

    /// Clears the error flags reported by the last `status`
    fn clear_errors(&self);

    fn read_data(&self) -> u8;

    fn write_data(&self, byte: u8);

    /// Enables or disables the interrupt for `event`
    fn set_interrupt(&self, event: Event, enable: bool);
}

/// An SPI instance that can be driven by [`Spi`]
pub trait Instance: Enable {
    type Registers: SpiRegisters;

    fn regs(&self) -> StaticRef<Self::Registers>;
}

impl<T> Instance for T
where
    T: Peripheral + Enable,
    T::Registers: SpiRegisters,
{
    type Registers = T::Registers;

    #[inline(always)]
    fn regs(&self) -> StaticRef<T::Registers> {
        self.registers()
    }
}

pub trait SckPin<SPI> {}
pub trait MisoPin<SPI> {}
pub trait MosiPin<SPI> {}

impl<SPI> MisoPin<SPI> for NoPin {}
impl<SPI> MosiPin<SPI> for NoPin {}

pub trait Pins<SPI> {}

impl<SPI, SCK, MISO, MOSI> Pins<SPI> for (SCK, MISO, MOSI)
where
    SCK: SckPin<SPI>,
    MISO: MisoPin<SPI>,
    MOSI: MosiPin<SPI>,
{
}

/// SPI master in full duplex
pub struct Spi<SPI: Instance, PINS> {
    spi: SPI,
    regs: StaticRef<SPI::Registers>,
    pins: PINS,
    _spi: PhantomData<SPI>,
}

impl<SPI, PINS> Spi<SPI, PINS>
where
    SPI: Instance,
    SPI::Bus: BusClock,
    PINS: Pins<SPI>,
{
    /// Enables the SPI clock and configures a master at the fastest rate
    /// not above `freq`
    pub fn new<F: Into<Hertz>>(
        spi: SPI,
        pins: PINS,
        mode: Mode,
        freq: F,
        clocks: &Clocks,
        bus: &mut SPI::Bus,
    ) -> Self {
        SPI::enable(bus);
        let pclk = <SPI::Bus as BusClock>::clock(clocks);
        let regs = spi.regs();
        regs.configure(mode, baud_rate_bits(pclk, freq.into()));
        Spi {
            spi,
            regs,
            pins,
            _spi: PhantomData,
        }
    }

    /// Starts listening for an interrupt event
    pub fn listen(&mut self, event: Event) {
        self.regs.set_interrupt(event, true)
    }

    /// Stops listening for an interrupt event
    pub fn unlisten(&mut self, event: Event) {
        self.regs.set_interrupt(event, false)
    }

    /// Returns true while a frame is being shifted
    pub fn is_busy(&self) -> bool {
        self.regs.status().busy
    }

    /// Disables the SPI and returns the token and pins
    pub fn release(self) -> (SPI, PINS) {
        self.regs.disable();
        (self.spi, self.pins)
    }
}

impl<SPI: Instance, PINS> Spi<SPI, PINS> {
    fn check(&self) -> Result<Status, Error> {
        let status = self.regs.status();
        match status.error() {
            Some(err) => {
                self.regs.clear_errors();
                Err(err)
            }
            None => Ok(status),
        }
    }
}

impl<SPI: Instance, PINS> FullDuplex<u8> for Spi<SPI, PINS> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        if self.check()?.rxne {
            Ok(self.regs.read_data())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn send(&mut self, byte: u8) -> nb::Result<(), Error> {
        if self.check()?.txe {
            self.regs.write_data(byte);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<SPI: Instance, PINS> embedded_hal::blocking::spi::transfer::Default<u8> for Spi<SPI, PINS> {}

impl<SPI: Instance, PINS> embedded_hal::blocking::spi::write::Default<u8> for Spi<SPI, PINS> {}
