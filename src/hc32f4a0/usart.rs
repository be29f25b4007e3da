// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USART registers and pin routing
//!
//! The baud generator divides the prescaled clock by `16 * (integer + 1)`
//! and optionally trims the result with a 7-bit fraction. The prescaler
//! divides PCLK1 by 1, 4, 16 or 64 and is raised only when the integer part
//! would overflow.
//!
//! Only 1 and 2 stop bits exist, and there is no idle line detection:
//! `Event::Idle` leaves the interrupt enables untouched.
//!
//! Communication functions 32 to 63 depend on the pin group. The table lists
//! the routes the EVB uses.

use super::gpio::{PH13, PH15};
use super::USART1;
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadOnly, ReadWrite, ReadWriteable, Readable, WriteOnly, Writeable};
use crate::serial::{self, Config, Event, InvalidConfig, Parity, RxPin, Status, StopBits, TxPin};
use crate::time::Hertz;

register_bitfields![u32,
    SR [
        TXE OFFSET(7) NUMBITS(1) [],
        TC OFFSET(6) NUMBITS(1) [],
        RXNF OFFSET(5) NUMBITS(1) [],
        ORE OFFSET(3) NUMBITS(1) [],
        FE OFFSET(1) NUMBITS(1) [],
        PE OFFSET(0) NUMBITS(1) []
    ],
    BRR [
        DIV_INTEGER OFFSET(8) NUMBITS(8) [],
        DIV_FRACTION OFFSET(0) NUMBITS(7) []
    ],
    CR1 [
        SBS OFFSET(31) NUMBITS(1) [],
        FBME OFFSET(29) NUMBITS(1) [],
        CORE OFFSET(19) NUMBITS(1) [],
        CFE OFFSET(17) NUMBITS(1) [],
        CPE OFFSET(16) NUMBITS(1) [],
        OVER8 OFFSET(15) NUMBITS(1) [],
        M OFFSET(12) NUMBITS(1) [],
        PCE OFFSET(10) NUMBITS(1) [],
        PS OFFSET(9) NUMBITS(1) [
            Even = 0,
            Odd = 1
        ],
        TXEIE OFFSET(7) NUMBITS(1) [],
        TCIE OFFSET(6) NUMBITS(1) [],
        RIE OFFSET(5) NUMBITS(1) [],
        TE OFFSET(3) NUMBITS(1) [],
        RE OFFSET(2) NUMBITS(1) []
    ],
    CR2 [
        STOP OFFSET(13) NUMBITS(1) []
    ],
    PR [
        PSC OFFSET(0) NUMBITS(2) []
    ]
];

#[repr(C)]
pub struct UsartRegisters {
    sr: ReadOnly<u32, SR::Register>,
    tdr: WriteOnly<u16>,
    rdr: ReadOnly<u16>,
    brr: ReadWrite<u32, BRR::Register>,
    cr1: ReadWrite<u32, CR1::Register>,
    cr2: ReadWrite<u32, CR2::Register>,
    cr3: ReadWrite<u32>,
    pr: ReadWrite<u32, PR::Register>,
}

/// Baud generator setting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudDivider {
    /// Clock prescaler, dividing by `4^psc`
    pub psc: u8,
    /// `BRR.DIV_INTEGER`, the integer divider minus one
    pub integer: u8,
    /// Fractional trim, if it improves on the integer divider
    pub fraction: Option<u8>,
}

/// Computes the baud generator setting for `baud` from `pclk`
pub fn baud_divider(pclk: Hertz, baud: u32) -> Result<BaudDivider, InvalidConfig> {
    if baud == 0 {
        return Err(InvalidConfig);
    }
    (0u8..4)
        .find_map(|psc| {
            let clk = u64::from(pclk.0 >> (2 * psc));
            let div = clk / (16 * u64::from(baud));
            if div == 0 || div > 256 {
                return None;
            }
            let fraction = (16 * u64::from(baud) * div * 256 / clk).checked_sub(128);
            Some(BaudDivider {
                psc,
                integer: (div - 1) as u8,
                fraction: fraction.filter(|f| *f <= 0x7F).map(|f| f as u8),
            })
        })
        .ok_or(InvalidConfig)
}

/// `CR2.STOP` for `stopbits`; there are no half stop bits
fn two_stop_bits(stopbits: StopBits) -> Result<bool, InvalidConfig> {
    match stopbits {
        StopBits::STOP1 => Ok(false),
        StopBits::STOP2 => Ok(true),
        StopBits::STOP0P5 | StopBits::STOP1P5 => Err(InvalidConfig),
    }
}

impl serial::UsartRegisters for UsartRegisters {
    fn validate(pclk: Hertz, config: &Config) -> Result<(), InvalidConfig> {
        config.nine_bit_frame()?;
        two_stop_bits(config.stopbits)?;
        baud_divider(pclk, config.baudrate.0).map(drop)
    }

    fn configure(&self, pclk: Hertz, config: &Config) -> Result<(), InvalidConfig> {
        let nine_bits = config.nine_bit_frame()?;
        let stop = two_stop_bits(config.stopbits)?;
        let div = baud_divider(pclk, config.baudrate.0)?;

        self.cr1.set(0);
        self.pr.write(PR::PSC.val(div.psc.into()));
        self.brr.write(
            BRR::DIV_INTEGER.val(div.integer.into())
                + BRR::DIV_FRACTION.val(div.fraction.unwrap_or(0).into()),
        );
        self.cr2.modify(CR2::STOP.val(stop.into()));
        let parity = match config.parity {
            Parity::ParityNone => CR1::PCE::CLEAR,
            Parity::ParityEven => CR1::PCE::SET + CR1::PS::Even,
            Parity::ParityOdd => CR1::PCE::SET + CR1::PS::Odd,
        };
        self.cr1.write(
            CR1::TE::SET
                + CR1::RE::SET
                + CR1::SBS::SET
                + CR1::FBME.val(div.fraction.is_some().into())
                + CR1::M.val(nine_bits.into())
                + parity,
        );
        Ok(())
    }

    fn disable(&self) {
        self.cr1.modify(CR1::TE::CLEAR + CR1::RE::CLEAR);
    }

    fn status(&self) -> Status {
        let sr = self.sr.extract();
        Status {
            txe: sr.is_set(SR::TXE),
            tc: sr.is_set(SR::TC),
            rxne: sr.is_set(SR::RXNF),
            idle: false,
            overrun: sr.is_set(SR::ORE),
            noise: false,
            framing: sr.is_set(SR::FE),
            parity: sr.is_set(SR::PE),
        }
    }

    fn clear_errors(&self) {
        self.cr1.modify(CR1::CPE::SET + CR1::CFE::SET + CR1::CORE::SET);
    }

    fn write_data(&self, byte: u8) {
        self.tdr.set(byte.into());
    }

    fn read_data(&self) -> u8 {
        self.rdr.get() as u8
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let field = match event {
            Event::Rxne => CR1::RIE,
            Event::Txe => CR1::TXEIE,
            Event::Idle => return,
        };
        self.cr1.modify(field.val(enable.into()));
    }
}

impl TxPin<USART1> for PH15<Alternate<32>> {}
impl RxPin<USART1> for PH13<Alternate<33>> {}

#[cfg(test)]
mod tests {
    use super::super::cmu::FCG3;
    use super::super::USART2;
    use super::super::gpio::{gpioh, Port};
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral};
    use crate::serial::{Error, NoPin, Serial};
    use embedded_hal::serial::{Read, Write};

    #[test]
    fn divider_for_the_console() {
        // 120 MHz / (16 * 65) * (128 + 127) / 256
        assert_eq!(
            baud_divider(Hertz(120_000_000), 115_200),
            Ok(BaudDivider {
                psc: 0,
                integer: 64,
                fraction: Some(127),
            })
        );
        // an exact integer divider needs no trim
        assert_eq!(
            baud_divider(Hertz(16_000_000), 1_000_000),
            Ok(BaudDivider {
                psc: 0,
                integer: 0,
                fraction: None,
            })
        );
        assert_eq!(baud_divider(Hertz(120_000_000), 9_600).map(|d| d.psc), Ok(1));
        assert_eq!(baud_divider(Hertz(120_000_000), 10_000_000), Err(InvalidConfig));
        assert_eq!(baud_divider(Hertz(120_000_000), 0), Err(InvalidConfig));
    }

    #[test]
    fn console_on_usart1() {
        let usart = unsafe { USART1::at(mock::block()) };
        let regs = usart.registers();
        let fcg = mock::block();
        let gpioh = gpioh::Parts::new(Port::mock(7));
        let pins = (gpioh.ph15.into_alternate::<32>(), gpioh.ph13.into_alternate::<33>());
        let clocks = Clocks::new(
            Hertz(240_000_000),
            Hertz(240_000_000),
            Hertz(120_000_000),
            Hertz(120_000_000),
        );

        let mut serial =
            Serial::new(usart, pins, Config::default(), &clocks, &mut FCG3::new(fcg)).unwrap();
        assert_eq!(mock::peek(regs, 0x08), 64 << 8 | 127);
        assert_eq!(mock::peek(regs, 0x0C), 1 << 31 | 1 << 29 | 1 << 3 | 1 << 2);
        assert_eq!(mock::peek(regs, 0x18), 0);

        mock::poke(regs, 0x00, 1 << 7);
        assert_eq!(serial.write(b'>'), Ok(()));
        assert_eq!(mock::peek16(regs, 0x04), u16::from(b'>'));

        mock::poke(regs, 0x00, 1 << 5 | 1 << 0);
        assert_eq!(serial.read(), Err(nb::Error::Other(Error::Parity)));
        assert_eq!(mock::peek(regs, 0x0C) & 0b1011 << 16, 0b1011 << 16);
    }

    #[test]
    fn half_stop_bits_are_rejected() {
        let usart = unsafe { USART1::at(mock::block()) };
        let config = Config::default().stopbits(StopBits::STOP1P5);
        assert_eq!(
            serial::UsartRegisters::configure(&*usart.registers(), Hertz(120_000_000), &config),
            Err(InvalidConfig)
        );
    }

    #[test]
    fn rejected_config_leaves_the_clock_gated() {
        let usart = unsafe { USART2::at(mock::block()) };
        let regs = usart.registers();
        let fcg = mock::block();
        mock::poke(fcg, 0x0C, 0xFFFF_FFFF);
        let clocks = Clocks::new(
            Hertz(240_000_000),
            Hertz(240_000_000),
            Hertz(120_000_000),
            Hertz(120_000_000),
        );
        let config = Config::default().stopbits(StopBits::STOP0P5);
        let result = Serial::new(usart, (NoPin, NoPin), config, &clocks, &mut FCG3::new(fcg));
        assert!(matches!(result, Err(InvalidConfig)));
        assert_eq!(mock::peek(fcg, 0x0C), 0xFFFF_FFFF);
        assert_eq!(mock::peek(regs, 0x0C), 0);
    }
}
