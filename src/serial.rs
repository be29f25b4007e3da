// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Communication (USART)
//!
//! This module contains the functions to utilize the USART (Universal
//! synchronous asynchronous receiver transmitter) of every family.
//!
//! ## Example usage:
//!
//! ```rust,ignore
//! // Take ownership of the peripherals and freeze the clocks
//! let dp = stm32f4::Peripherals::take().unwrap();
//! let mut rcc = dp.RCC.constrain();
//! let clocks = rcc.cfgr.use_hse(8.mhz()).sysclk(168.mhz()).freeze(&dp.FLASH)?;
//! let gpioa = dp.GPIOA.split(&mut rcc.ahb1);
//!
//! // USART2 on PA2/PA3, alternate function 7
//! let tx = gpioa.pa2.into_alternate::<7>();
//! let rx = gpioa.pa3.into_alternate::<7>();
//! let serial = Serial::new(
//!     dp.USART2,
//!     (tx, rx),
//!     Config::default().baudrate(115_200.bps()),
//!     &clocks,
//!     &mut rcc.apb1,
//! )?;
//!
//! // Separate into tx and rx channels
//! let (mut tx, mut rx) = serial.split();
//!
//! // Write 'R' to the USART
//! block!(tx.write(b'R')).ok();
//! // Receive a byte from the USART and store it in "received"
//! let received = block!(rx.read()).unwrap();
//! ```

use core::convert::Infallible;
use core::fmt;
use core::marker::PhantomData;

use embedded_hal::serial::{Read, Write};

use crate::clocks::{BusClock, Clocks, Enable};
use crate::reg::{Peripheral, StaticRef};
use crate::time::{Bps, Hertz, U32Ext};

/// Interrupt event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// New data has been received
    Rxne,
    /// New data can be sent
    Txe,
    /// Idle line state detected
    Idle,
}

/// Serial error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// RX buffer overrun
    Overrun,
    /// Parity check error
    Parity,
}

/// The requested frame format or baud rate cannot be produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    DataBits8,
    DataBits9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    ParityNone,
    ParityEven,
    ParityOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 stop bit
    STOP1,
    /// 0.5 stop bits
    STOP0P5,
    /// 2 stop bits
    STOP2,
    /// 1.5 stop bits
    STOP1P5,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub baudrate: Bps,
    pub wordlength: WordLength,
    pub parity: Parity,
    pub stopbits: StopBits,
}

impl Config {
    pub fn baudrate(mut self, baudrate: Bps) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn parity_none(mut self) -> Self {
        self.parity = Parity::ParityNone;
        self
    }

    pub fn parity_even(mut self) -> Self {
        self.parity = Parity::ParityEven;
        self
    }

    pub fn parity_odd(mut self) -> Self {
        self.parity = Parity::ParityOdd;
        self
    }

    pub fn wordlength_8bits(mut self) -> Self {
        self.wordlength = WordLength::DataBits8;
        self
    }

    pub fn wordlength_9bits(mut self) -> Self {
        self.wordlength = WordLength::DataBits9;
        self
    }

    pub fn stopbits(mut self, stopbits: StopBits) -> Self {
        self.stopbits = stopbits;
        self
    }

    /// Whether the frame carries 9 bits between start and stop bits
    ///
    /// The parity bit takes the place of the most significant data bit, so 8
    /// data bits with parity need a 9-bit frame. 9 data bits with parity
    /// would need 10 and no family supports that.
    pub fn nine_bit_frame(&self) -> Result<bool, InvalidConfig> {
        match (self.wordlength, self.parity) {
            (WordLength::DataBits8, Parity::ParityNone) => Ok(false),
            (WordLength::DataBits8, _) => Ok(true),
            (WordLength::DataBits9, Parity::ParityNone) => Ok(true),
            (WordLength::DataBits9, _) => Err(InvalidConfig),
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            baudrate: 115_200_u32.bps(),
            wordlength: WordLength::DataBits8,
            parity: Parity::ParityNone,
            stopbits: StopBits::STOP1,
        }
    }
}

/// Baud rate register value for 16x oversampling
///
/// The mantissa/fraction pair of the AT32, GD32 and STM32 USARTs packs to
/// `pclk / baud`, rounded to nearest.
pub fn brr_over16(pclk: Hertz, baud: Bps) -> Result<u16, InvalidConfig> {
    if baud.0 == 0 {
        return Err(InvalidConfig);
    }
    let div = (pclk.0 + baud.0 / 2) / baud.0;
    if div < 16 {
        return Err(InvalidConfig);
    }
    cast::u16(div).map_err(|_| InvalidConfig)
}

/// Snapshot of the USART status flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub txe: bool,
    pub tc: bool,
    pub rxne: bool,
    pub idle: bool,
    pub overrun: bool,
    pub noise: bool,
    pub framing: bool,
    pub parity: bool,
}

impl Status {
    /// The error to report for this status, if any
    pub fn error(&self) -> Option<Error> {
        if self.parity {
            Some(Error::Parity)
        } else if self.framing {
            Some(Error::Framing)
        } else if self.noise {
            Some(Error::Noise)
        } else if self.overrun {
            Some(Error::Overrun)
        } else {
            None
        }
    }
}

/// Register access to one USART, implemented by each family
pub trait UsartRegisters {
    /// Checks that `config` can be programmed at `pclk`, without touching
    /// the hardware
    ///
    /// The default accepts what [`brr_over16`] and
    /// [`Config::nine_bit_frame`] accept.
    fn validate(pclk: Hertz, config: &Config) -> Result<(), InvalidConfig>
    where
        Self: Sized,
    {
        config.nine_bit_frame()?;
        brr_over16(pclk, config.baudrate).map(drop)
    }

    /// Programs frame format and baud rate, then enables transmitter and
    /// receiver
    fn configure(&self, pclk: Hertz, config: &Config) -> Result<(), InvalidConfig>;

    /// Disables the USART
    fn disable(&self);

    /// Reads the status flags
    fn status(&self) -> Status;

    /// Clears the error flags reported by the last `status`
    fn clear_errors(&self);

    /// Writes a byte into the transmit data register
    fn write_data(&self, byte: u8);

    /// Reads a byte from the receive data register
    fn read_data(&self) -> u8;

    /// Enables or disables the interrupt for `event`
    fn set_interrupt(&self, event: Event, enable: bool);
}

/// A USART instance that can be driven by [`Serial`]
pub trait Instance: Enable {
    type Registers: UsartRegisters;

    fn regs(&self) -> StaticRef<Self::Registers>;
}

impl<T> Instance for T
where
    T: Peripheral + Enable,
    T::Registers: UsartRegisters,
{
    type Registers = T::Registers;

    #[inline(always)]
    fn regs(&self) -> StaticRef<T::Registers> {
        self.registers()
    }
}

/// Pin that can carry the TX signal of `USART`
pub trait TxPin<USART> {}

/// Pin that can carry the RX signal of `USART`
pub trait RxPin<USART> {}

pub use crate::gpio::NoPin;

impl<USART> TxPin<USART> for NoPin {}
impl<USART> RxPin<USART> for NoPin {}

pub trait Pins<USART> {}

impl<USART, TX, RX> Pins<USART> for (TX, RX)
where
    TX: TxPin<USART>,
    RX: RxPin<USART>,
{
}

/// Serial abstraction
pub struct Serial<USART, PINS> {
    usart: USART,
    pins: PINS,
}

/// Serial receiver
pub struct Rx<USART: Instance> {
    regs: StaticRef<USART::Registers>,
    _usart: PhantomData<USART>,
}

/// Serial transmitter
pub struct Tx<USART: Instance> {
    regs: StaticRef<USART::Registers>,
    _usart: PhantomData<USART>,
}

impl<USART, PINS> Serial<USART, PINS>
where
    USART: Instance,
    USART::Bus: BusClock,
    PINS: Pins<USART>,
{
    /// Configures the USART and creates a new Serial instance
    ///
    /// An invalid `config` is rejected before the USART clock is enabled.
    pub fn new(
        usart: USART,
        pins: PINS,
        config: Config,
        clocks: &Clocks,
        bus: &mut USART::Bus,
    ) -> Result<Self, InvalidConfig> {
        let pclk = <USART::Bus as BusClock>::clock(clocks);
        USART::Registers::validate(pclk, &config)?;
        USART::enable(bus);
        usart.regs().configure(pclk, &config)?;
        Ok(Serial { usart, pins })
    }

    /// Starts listening for an interrupt event
    pub fn listen(&mut self, event: Event) {
        self.usart.regs().set_interrupt(event, true)
    }

    /// Stops listening for an interrupt event
    pub fn unlisten(&mut self, event: Event) {
        self.usart.regs().set_interrupt(event, false)
    }

    /// Returns ownership of the borrowed register handles
    pub fn release(self) -> (USART, PINS) {
        self.usart.regs().disable();
        (self.usart, self.pins)
    }

    /// Separates the serial struct into separate channel objects for sending (Tx) and
    /// receiving (Rx)
    pub fn split(self) -> (Tx<USART>, Rx<USART>) {
        let regs = self.usart.regs();
        (
            Tx {
                regs,
                _usart: PhantomData,
            },
            Rx {
                regs,
                _usart: PhantomData,
            },
        )
    }
}

impl<USART: Instance> Tx<USART> {
    /// Starts listening for the transmit buffer empty interrupt
    pub fn listen(&mut self) {
        self.regs.set_interrupt(Event::Txe, true)
    }

    /// Stops listening for the transmit buffer empty interrupt
    pub fn unlisten(&mut self) {
        self.regs.set_interrupt(Event::Txe, false)
    }
}

impl<USART: Instance> Rx<USART> {
    /// Starts listening for the receive buffer not empty interrupt
    pub fn listen(&mut self) {
        self.regs.set_interrupt(Event::Rxne, true)
    }

    /// Stops listening for the receive buffer not empty interrupt
    pub fn unlisten(&mut self) {
        self.regs.set_interrupt(Event::Rxne, false)
    }
}

fn read<R: UsartRegisters>(regs: &R) -> nb::Result<u8, Error> {
    let status = regs.status();
    if let Some(err) = status.error() {
        regs.clear_errors();
        Err(nb::Error::Other(err))
    } else if status.rxne {
        Ok(regs.read_data())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

fn write<R: UsartRegisters>(regs: &R, byte: u8) -> nb::Result<(), Infallible> {
    if regs.status().txe {
        regs.write_data(byte);
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

fn flush<R: UsartRegisters>(regs: &R) -> nb::Result<(), Infallible> {
    if regs.status().tc {
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

impl<USART: Instance> Read<u8> for Rx<USART> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        read(&*self.regs)
    }
}

impl<USART: Instance> Write<u8> for Tx<USART> {
    type Error = Infallible;

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        flush(&*self.regs)
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        write(&*self.regs, byte)
    }
}

impl<USART: Instance, PINS> Read<u8> for Serial<USART, PINS> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        read(&*self.usart.regs())
    }
}

impl<USART: Instance, PINS> Write<u8> for Serial<USART, PINS> {
    type Error = Infallible;

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        flush(&*self.usart.regs())
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        write(&*self.usart.regs(), byte)
    }
}

impl<USART: Instance> embedded_hal::blocking::serial::write::Default<u8> for Tx<USART> {}

impl<USART: Instance> fmt::Write for Tx<USART> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes()
            .try_for_each(|c| nb::block!(self.write(c)))
            .map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_115200_8n1() {
        let config = Config::default();
        assert_eq!(config.baudrate, Bps(115_200));
        assert_eq!(config.nine_bit_frame(), Ok(false));
        assert_eq!(config.stopbits, StopBits::STOP1);
    }

    #[test]
    fn parity_widens_the_frame() {
        assert_eq!(Config::default().parity_even().nine_bit_frame(), Ok(true));
        assert_eq!(Config::default().wordlength_9bits().nine_bit_frame(), Ok(true));
        assert_eq!(
            Config::default().wordlength_9bits().parity_odd().nine_bit_frame(),
            Err(InvalidConfig)
        );
    }

    #[test]
    fn baud_divider() {
        // 84 MHz APB2 at 115200 baud: 729.17 -> 729 (0x2D9)
        assert_eq!(brr_over16(Hertz(84_000_000), Bps(115_200)), Ok(729));
        // 42 MHz APB1 at 9600 baud: 4375
        assert_eq!(brr_over16(Hertz(42_000_000), Bps(9_600)), Ok(4_375));
        // too slow for a 16-bit divider
        assert_eq!(brr_over16(Hertz(144_000_000), Bps(1_200)), Err(InvalidConfig));
        // faster than pclk / 16
        assert_eq!(brr_over16(Hertz(16_000_000), Bps(2_000_000)), Err(InvalidConfig));
        assert_eq!(brr_over16(Hertz(16_000_000), Bps(0)), Err(InvalidConfig));
    }

    #[test]
    fn error_priority() {
        let status = Status {
            overrun: true,
            framing: true,
            ..Status::default()
        };
        assert_eq!(status.error(), Some(Error::Framing));
        assert_eq!(Status::default().error(), None);
    }
}
