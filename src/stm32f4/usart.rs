// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USART register block and pin routing
//!
//! | Instance | AF | TX               | RX               |
//! |----------|----|------------------|------------------|
//! | USART1   | 7  | PA9, PB6         | PA10, PB7        |
//! | USART2   | 7  | PA2, PD5         | PA3, PD6         |
//! | USART3   | 7  | PB10, PC10, PD8  | PB11, PC11, PD9  |
//! | UART4    | 8  | PA0, PC10        | PA1, PC11        |
//! | UART5    | 8  | PC12             | PD2              |
//! | USART6   | 8  | PC6, PG14        | PC7, PG9         |

use super::gpio::*;
use super::{UART4, UART5, USART1, USART2, USART3, USART6};
use crate::gpio::Alternate;
use crate::serial::{self, Config, Event, InvalidConfig, Parity, RxPin, Status, StopBits, TxPin};
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::time::Hertz;

register_bitfields![u32,
    SR [
        TXE OFFSET(7) NUMBITS(1) [],
        TC OFFSET(6) NUMBITS(1) [],
        RXNE OFFSET(5) NUMBITS(1) [],
        IDLE OFFSET(4) NUMBITS(1) [],
        ORE OFFSET(3) NUMBITS(1) [],
        NF OFFSET(2) NUMBITS(1) [],
        FE OFFSET(1) NUMBITS(1) [],
        PE OFFSET(0) NUMBITS(1) []
    ],
    CR1 [
        OVER8 OFFSET(15) NUMBITS(1) [],
        UE OFFSET(13) NUMBITS(1) [],
        M OFFSET(12) NUMBITS(1) [],
        PCE OFFSET(10) NUMBITS(1) [],
        PS OFFSET(9) NUMBITS(1) [],
        TXEIE OFFSET(7) NUMBITS(1) [],
        TCIE OFFSET(6) NUMBITS(1) [],
        RXNEIE OFFSET(5) NUMBITS(1) [],
        IDLEIE OFFSET(4) NUMBITS(1) [],
        TE OFFSET(3) NUMBITS(1) [],
        RE OFFSET(2) NUMBITS(1) []
    ],
    CR2 [
        STOP OFFSET(12) NUMBITS(2) [
            One = 0,
            Half = 1,
            Two = 2,
            OneAndHalf = 3
        ]
    ]
];

#[repr(C)]
pub struct UsartRegisters {
    sr: ReadWrite<u32, SR::Register>,
    dr: ReadWrite<u32>,
    brr: ReadWrite<u32>,
    cr1: ReadWrite<u32, CR1::Register>,
    cr2: ReadWrite<u32, CR2::Register>,
    cr3: ReadWrite<u32>,
    gtpr: ReadWrite<u32>,
}

impl serial::UsartRegisters for UsartRegisters {
    fn configure(&self, pclk: Hertz, config: &Config) -> Result<(), InvalidConfig> {
        let nine_bits = config.nine_bit_frame()?;
        let brr = serial::brr_over16(pclk, config.baudrate)?;

        self.cr1.set(0);
        self.brr.set(u32::from(brr));
        self.cr2.modify(match config.stopbits {
            StopBits::STOP1 => CR2::STOP::One,
            StopBits::STOP0P5 => CR2::STOP::Half,
            StopBits::STOP2 => CR2::STOP::Two,
            StopBits::STOP1P5 => CR2::STOP::OneAndHalf,
        });
        self.cr1.write(
            CR1::UE::SET
                + CR1::TE::SET
                + CR1::RE::SET
                + CR1::M.val(nine_bits.into())
                + CR1::PCE.val((config.parity != Parity::ParityNone).into())
                + CR1::PS.val((config.parity == Parity::ParityOdd).into()),
        );
        Ok(())
    }

    fn disable(&self) {
        self.cr1.modify(CR1::UE::CLEAR);
    }

    fn status(&self) -> Status {
        let sr = self.sr.extract();
        Status {
            txe: sr.is_set(SR::TXE),
            tc: sr.is_set(SR::TC),
            rxne: sr.is_set(SR::RXNE),
            idle: sr.is_set(SR::IDLE),
            overrun: sr.is_set(SR::ORE),
            noise: sr.is_set(SR::NF),
            framing: sr.is_set(SR::FE),
            parity: sr.is_set(SR::PE),
        }
    }

    fn clear_errors(&self) {
        // error flags clear on a status read followed by a data read
        self.sr.get();
        self.dr.get();
    }

    fn write_data(&self, byte: u8) {
        self.dr.set(u32::from(byte));
    }

    fn read_data(&self) -> u8 {
        self.dr.get() as u8
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let bit = u32::from(enable);
        self.cr1.modify(match event {
            Event::Rxne => CR1::RXNEIE.val(bit),
            Event::Txe => CR1::TXEIE.val(bit),
            Event::Idle => CR1::IDLEIE.val(bit),
        });
    }
}

macro_rules! pins {
    ($($USART:ident: TX: [$($TX:ident<$TXAF:literal>),+] RX: [$($RX:ident<$RXAF:literal>),+])+) => {
        $(
            $(impl TxPin<$USART> for $TX<Alternate<$TXAF>> {})+
            $(impl RxPin<$USART> for $RX<Alternate<$RXAF>> {})+
        )+
    };
}

pins! {
    USART1: TX: [PA9<7>, PB6<7>] RX: [PA10<7>, PB7<7>]
    USART2: TX: [PA2<7>, PD5<7>] RX: [PA3<7>, PD6<7>]
    USART3: TX: [PB10<7>, PC10<7>, PD8<7>] RX: [PB11<7>, PC11<7>, PD9<7>]
    UART4: TX: [PA0<8>, PC10<8>] RX: [PA1<8>, PC11<8>]
    UART5: TX: [PC12<8>] RX: [PD2<8>]
    USART6: TX: [PC6<8>, PG14<8>] RX: [PC7<8>, PG9<8>]
}

#[cfg(test)]
mod tests {
    use super::super::rcc::APB2;
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::mock;
    use crate::serial::{Error, NoPin, Serial};
    use crate::time::Bps;
    use core::mem::offset_of;
    use embedded_hal::serial::{Read, Write};

    const CLOCKS: Clocks = Clocks::new(
        Hertz(168_000_000),
        Hertz(168_000_000),
        Hertz(42_000_000),
        Hertz(84_000_000),
    );

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(UsartRegisters, brr), 0x08);
        assert_eq!(offset_of!(UsartRegisters, gtpr), 0x18);
    }

    #[test]
    fn serial_round_trip() {
        let usart = unsafe { USART1::at(mock::block()) };
        let regs = crate::reg::Peripheral::registers(&usart);
        let rcc = mock::block();
        let mut apb2 = APB2::new(rcc);

        let serial = Serial::new(usart, (NoPin, NoPin), Config::default(), &CLOCKS, &mut apb2)
            .unwrap();
        assert_eq!(mock::peek(rcc, 0x44), 1 << 4);
        assert_eq!(mock::peek(regs, 0x08), 729);
        assert_eq!(mock::peek(regs, 0x0C), 0x200C);

        let (mut tx, mut rx) = serial.split();
        assert_eq!(tx.write(b'R'), Err(nb::Error::WouldBlock));
        mock::poke(regs, 0x00, 1 << 7);
        assert_eq!(tx.write(b'R'), Ok(()));
        assert_eq!(mock::peek(regs, 0x04), u32::from(b'R'));

        assert_eq!(rx.read(), Err(nb::Error::WouldBlock));
        mock::poke(regs, 0x04, u32::from(b'x'));
        mock::poke(regs, 0x00, 1 << 5);
        assert_eq!(rx.read(), Ok(b'x'));

        mock::poke(regs, 0x00, 1 << 5 | 1 << 3);
        assert_eq!(rx.read(), Err(nb::Error::Other(Error::Overrun)));
    }

    #[test]
    fn frame_format() {
        let usart = unsafe { USART2::at(mock::block()) };
        let regs = crate::reg::Peripheral::registers(&usart);
        let config = Config::default()
            .baudrate(Bps(9_600))
            .parity_odd()
            .stopbits(StopBits::STOP2);
        serial::UsartRegisters::configure(&*regs, CLOCKS.pclk1(), &config).unwrap();
        assert_eq!(mock::peek(regs, 0x08), 4_375);
        assert_eq!(mock::peek(regs, 0x0C), 0x200C | 1 << 12 | 1 << 10 | 1 << 9);
        assert_eq!(mock::peek(regs, 0x10), 2 << 12);

        let too_fast = Config::default().baudrate(Bps(10_000_000));
        assert_eq!(
            serial::UsartRegisters::configure(&*regs, CLOCKS.pclk1(), &too_fast),
            Err(InvalidConfig)
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_the_clock() {
        let usart = unsafe { USART6::at(mock::block()) };
        let regs = crate::reg::Peripheral::registers(&usart);
        let rcc = mock::block();
        let config = Config::default().wordlength_9bits().parity_even();
        let result = Serial::new(usart, (NoPin, NoPin), config, &CLOCKS, &mut APB2::new(rcc));
        assert!(matches!(result, Err(InvalidConfig)));
        assert_eq!(mock::peek(rcc, 0x44), 0);
        assert_eq!(mock::peek(regs, 0x0C), 0);
    }
}
