// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USART/UART registers and pin routing
//!
//! | Instance | AF | TX              | RX              |
//! |----------|----|-----------------|-----------------|
//! | USART0   | 7  | PA9, PB6        | PA10, PB7       |
//! | USART1   | 7  | PA2, PD5        | PA3, PD6        |
//! | USART2   | 7  | PB10, PC10, PD8 | PB11, PC11, PD9 |
//! | UART3    | 8  | PA0, PC10       | PA1, PC11       |
//! | UART4    | 8  | PC12            | PD2             |
//! | USART5   | 8  | PC6, PG14       | PC7, PG9        |

use super::gpio::*;
use super::{UART3, UART4, USART0, USART1, USART2, USART5};
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::serial::{self, Config, Event, InvalidConfig, Parity, RxPin, Status, StopBits, TxPin};
use crate::time::Hertz;

register_bitfields![u32,
    STAT0 [
        TBE OFFSET(7) NUMBITS(1) [],
        TC OFFSET(6) NUMBITS(1) [],
        RBNE OFFSET(5) NUMBITS(1) [],
        IDLEF OFFSET(4) NUMBITS(1) [],
        ORERR OFFSET(3) NUMBITS(1) [],
        NERR OFFSET(2) NUMBITS(1) [],
        FERR OFFSET(1) NUMBITS(1) [],
        PERR OFFSET(0) NUMBITS(1) []
    ],
    CTL0 [
        UEN OFFSET(13) NUMBITS(1) [],
        WL OFFSET(12) NUMBITS(1) [],
        PCEN OFFSET(10) NUMBITS(1) [],
        PM OFFSET(9) NUMBITS(1) [
            Even = 0,
            Odd = 1
        ],
        TBEIE OFFSET(7) NUMBITS(1) [],
        TCIE OFFSET(6) NUMBITS(1) [],
        RBNEIE OFFSET(5) NUMBITS(1) [],
        IDLEIE OFFSET(4) NUMBITS(1) [],
        TEN OFFSET(3) NUMBITS(1) [],
        REN OFFSET(2) NUMBITS(1) []
    ],
    CTL1 [
        STB OFFSET(12) NUMBITS(2) [
            Stop1 = 0,
            Stop0_5 = 1,
            Stop2 = 2,
            Stop1_5 = 3
        ]
    ]
];

#[repr(C)]
pub struct UsartRegisters {
    stat0: ReadWrite<u32, STAT0::Register>,
    data: ReadWrite<u32>,
    baud: ReadWrite<u32>,
    ctl0: ReadWrite<u32, CTL0::Register>,
    ctl1: ReadWrite<u32, CTL1::Register>,
    ctl2: ReadWrite<u32>,
    gp: ReadWrite<u32>,
}

impl serial::UsartRegisters for UsartRegisters {
    fn configure(&self, pclk: Hertz, config: &Config) -> Result<(), InvalidConfig> {
        let wl = config.nine_bit_frame()?;
        let baud = serial::brr_over16(pclk, config.baudrate)?;

        // UEN must be clear while the frame format changes
        self.ctl0.set(0);
        self.baud.set(baud.into());
        self.ctl1.modify(match config.stopbits {
            StopBits::STOP1 => CTL1::STB::Stop1,
            StopBits::STOP0P5 => CTL1::STB::Stop0_5,
            StopBits::STOP2 => CTL1::STB::Stop2,
            StopBits::STOP1P5 => CTL1::STB::Stop1_5,
        });
        let parity = match config.parity {
            Parity::ParityNone => CTL0::PCEN::CLEAR,
            Parity::ParityEven => CTL0::PCEN::SET + CTL0::PM::Even,
            Parity::ParityOdd => CTL0::PCEN::SET + CTL0::PM::Odd,
        };
        self.ctl0
            .write(CTL0::UEN::SET + CTL0::TEN::SET + CTL0::REN::SET + CTL0::WL.val(wl.into()) + parity);
        Ok(())
    }

    fn disable(&self) {
        self.ctl0.modify(CTL0::UEN::CLEAR);
    }

    fn status(&self) -> Status {
        let stat = self.stat0.extract();
        Status {
            txe: stat.is_set(STAT0::TBE),
            tc: stat.is_set(STAT0::TC),
            rxne: stat.is_set(STAT0::RBNE),
            idle: stat.is_set(STAT0::IDLEF),
            overrun: stat.is_set(STAT0::ORERR),
            noise: stat.is_set(STAT0::NERR),
            framing: stat.is_set(STAT0::FERR),
            parity: stat.is_set(STAT0::PERR),
        }
    }

    fn clear_errors(&self) {
        self.stat0.get();
        self.data.get();
    }

    fn write_data(&self, byte: u8) {
        self.data.set(byte.into());
    }

    fn read_data(&self) -> u8 {
        self.data.get() as u8
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let bit = u32::from(enable);
        let field = match event {
            Event::Rxne => CTL0::RBNEIE,
            Event::Txe => CTL0::TBEIE,
            Event::Idle => CTL0::IDLEIE,
        };
        self.ctl0.modify(field.val(bit));
    }
}

macro_rules! pins {
    ($($USART:ident<$AF:literal>: TX: [$($TX:ident),+] RX: [$($RX:ident),+])+) => {
        $(
            $(impl TxPin<$USART> for $TX<Alternate<$AF>> {})+
            $(impl RxPin<$USART> for $RX<Alternate<$AF>> {})+
        )+
    };
}

pins! {
    USART0<7>: TX: [PA9, PB6] RX: [PA10, PB7]
    USART1<7>: TX: [PA2, PD5] RX: [PA3, PD6]
    USART2<7>: TX: [PB10, PC10, PD8] RX: [PB11, PC11, PD9]
    UART3<8>: TX: [PA0, PC10] RX: [PA1, PC11]
    UART4<8>: TX: [PC12] RX: [PD2]
    USART5<8>: TX: [PC6, PG14] RX: [PC7, PG9]
}
