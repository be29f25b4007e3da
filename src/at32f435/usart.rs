// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USART/UART registers and pin routing
//!
//! `BAUDR` holds the whole divider `PCLK / baud`, which is numerically the
//! value an oversampling-by-16 BRR would carry.

use super::gpio::*;
use super::{UART4, UART5, USART1, USART2, USART3, USART6};
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::serial::{self, Config, Event, InvalidConfig, Parity, RxPin, Status, StopBits, TxPin};
use crate::time::Hertz;

register_bitfields![u32,
    STS [
        TDBE OFFSET(7) NUMBITS(1) [],
        TDC OFFSET(6) NUMBITS(1) [],
        RDBF OFFSET(5) NUMBITS(1) [],
        IDLEF OFFSET(4) NUMBITS(1) [],
        ROERR OFFSET(3) NUMBITS(1) [],
        NERR OFFSET(2) NUMBITS(1) [],
        FERR OFFSET(1) NUMBITS(1) [],
        PERR OFFSET(0) NUMBITS(1) []
    ],
    CTRL1 [
        DBN1 OFFSET(28) NUMBITS(1) [],
        UEN OFFSET(13) NUMBITS(1) [],
        DBN0 OFFSET(12) NUMBITS(1) [],
        PEN OFFSET(10) NUMBITS(1) [],
        PSEL OFFSET(9) NUMBITS(1) [
            Even = 0,
            Odd = 1
        ],
        TDBEIEN OFFSET(7) NUMBITS(1) [],
        TDCIEN OFFSET(6) NUMBITS(1) [],
        RDBFIEN OFFSET(5) NUMBITS(1) [],
        IDLEIEN OFFSET(4) NUMBITS(1) [],
        TEN OFFSET(3) NUMBITS(1) [],
        REN OFFSET(2) NUMBITS(1) []
    ],
    CTRL2 [
        STOPBN OFFSET(12) NUMBITS(2) [
            Stop1 = 0,
            Stop0_5 = 1,
            Stop2 = 2,
            Stop1_5 = 3
        ]
    ]
];

#[repr(C)]
pub struct UsartRegisters {
    sts: ReadWrite<u32, STS::Register>,
    dt: ReadWrite<u32>,
    baudr: ReadWrite<u32>,
    ctrl1: ReadWrite<u32, CTRL1::Register>,
    ctrl2: ReadWrite<u32, CTRL2::Register>,
    ctrl3: ReadWrite<u32>,
    gdiv: ReadWrite<u32>,
}

impl serial::UsartRegisters for UsartRegisters {
    fn configure(&self, pclk: Hertz, config: &Config) -> Result<(), InvalidConfig> {
        let nine_bits = config.nine_bit_frame()?;
        let div = serial::brr_over16(pclk, config.baudrate)?;

        self.ctrl1.set(0);
        self.baudr.set(div.into());
        self.ctrl2.modify(match config.stopbits {
            StopBits::STOP1 => CTRL2::STOPBN::Stop1,
            StopBits::STOP0P5 => CTRL2::STOPBN::Stop0_5,
            StopBits::STOP2 => CTRL2::STOPBN::Stop2,
            StopBits::STOP1P5 => CTRL2::STOPBN::Stop1_5,
        });
        let parity = match config.parity {
            Parity::ParityNone => CTRL1::PEN::CLEAR,
            Parity::ParityEven => CTRL1::PEN::SET + CTRL1::PSEL::Even,
            Parity::ParityOdd => CTRL1::PEN::SET + CTRL1::PSEL::Odd,
        };
        self.ctrl1.write(
            CTRL1::UEN::SET
                + CTRL1::TEN::SET
                + CTRL1::REN::SET
                + CTRL1::DBN0.val(nine_bits.into())
                + parity,
        );
        Ok(())
    }

    fn disable(&self) {
        self.ctrl1.modify(CTRL1::UEN::CLEAR);
    }

    fn status(&self) -> Status {
        let sts = self.sts.extract();
        Status {
            txe: sts.is_set(STS::TDBE),
            tc: sts.is_set(STS::TDC),
            rxne: sts.is_set(STS::RDBF),
            idle: sts.is_set(STS::IDLEF),
            overrun: sts.is_set(STS::ROERR),
            noise: sts.is_set(STS::NERR),
            framing: sts.is_set(STS::FERR),
            parity: sts.is_set(STS::PERR),
        }
    }

    // STS then DT
    fn clear_errors(&self) {
        self.sts.get();
        self.dt.get();
    }

    fn write_data(&self, byte: u8) {
        self.dt.set(byte.into());
    }

    fn read_data(&self) -> u8 {
        self.dt.get() as u8
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let field = match event {
            Event::Rxne => CTRL1::RDBFIEN,
            Event::Txe => CTRL1::TDBEIEN,
            Event::Idle => CTRL1::IDLEIEN,
        };
        self.ctrl1.modify(field.val(enable.into()));
    }
}

macro_rules! pins {
    ($($USART:ident: TX: [$($TX:ty),+] RX: [$($RX:ty),+])+) => {
        $(
            $(impl TxPin<$USART> for $TX {})+
            $(impl RxPin<$USART> for $RX {})+
        )+
    };
}

pins! {
    USART1: TX: [PA9<Alternate<7>>, PB6<Alternate<7>>] RX: [PA10<Alternate<7>>, PB7<Alternate<7>>]
    USART2: TX: [PA2<Alternate<7>>, PD5<Alternate<7>>] RX: [PA3<Alternate<7>>, PD6<Alternate<7>>]
    USART3: TX: [PB10<Alternate<7>>, PC10<Alternate<7>>, PD8<Alternate<7>>]
        RX: [PB11<Alternate<7>>, PC11<Alternate<7>>, PD9<Alternate<7>>]
    UART4: TX: [PA0<Alternate<8>>, PC10<Alternate<8>>] RX: [PA1<Alternate<8>>, PC11<Alternate<8>>]
    UART5: TX: [PC12<Alternate<8>>] RX: [PD2<Alternate<8>>]
    USART6: TX: [PC6<Alternate<8>>, PG14<Alternate<8>>] RX: [PC7<Alternate<8>>, PG9<Alternate<8>>]
}

#[cfg(test)]
mod tests {
    use super::super::crm::APB2;
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral};
    use crate::serial::{Error, Serial};
    use embedded_hal::serial::{Read, Write};

    const CLOCKS: Clocks = Clocks::new(
        Hertz(288_000_000),
        Hertz(288_000_000),
        Hertz(144_000_000),
        Hertz(144_000_000),
    );

    #[test]
    fn console_on_usart1() {
        let usart = unsafe { USART1::at(mock::block()) };
        let regs = usart.registers();
        let crm = mock::block();
        let gpioa = gpioa::Parts::new(Port::mock());
        let pins = (gpioa.pa9.into_alternate::<7>(), gpioa.pa10.into_alternate::<7>());

        let mut serial =
            Serial::new(usart, pins, Config::default(), &CLOCKS, &mut APB2::new(crm)).unwrap();
        assert_eq!(mock::peek(crm, 0x44), 1 << 4);
        // 144 MHz / 115200 = 1250
        assert_eq!(mock::peek(regs, 0x08), 1250);
        assert_eq!(mock::peek(regs, 0x0C), 1 << 13 | 1 << 3 | 1 << 2);

        mock::poke(regs, 0x00, 1 << 7);
        assert_eq!(serial.write(b'A'), Ok(()));
        assert_eq!(mock::peek(regs, 0x04), u32::from(b'A'));

        mock::poke(regs, 0x00, 1 << 5 | 1 << 3);
        assert_eq!(serial.read(), Err(nb::Error::Other(Error::Overrun)));
    }

    #[test]
    fn odd_parity_and_two_stop_bits() {
        let usart = unsafe { UART4::at(mock::block()) };
        let regs = usart.registers();
        let config = Config::default().parity_odd().stopbits(StopBits::STOP2);
        serial::UsartRegisters::configure(&*regs, CLOCKS.pclk1(), &config).unwrap();
        assert_eq!(
            mock::peek(regs, 0x0C),
            1 << 13 | 1 << 12 | 1 << 10 | 1 << 9 | 1 << 3 | 1 << 2
        );
        assert_eq!(mock::peek(regs, 0x10), 2 << 12);

        let config = Config::default().wordlength_9bits().parity_odd();
        assert_eq!(
            serial::UsartRegisters::configure(&*regs, CLOCKS.pclk1(), &config),
            Err(InvalidConfig)
        );
    }
}
