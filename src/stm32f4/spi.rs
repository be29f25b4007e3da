// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SPI register block and pin routing
//!
//! | Instance | AF | SCK        | MISO       | MOSI       |
//! |----------|----|------------|------------|------------|
//! | SPI1     | 5  | PA5, PB3   | PA6, PB4   | PA7, PB5   |
//! | SPI2     | 5  | PB10, PB13 | PB14, PC2  | PB15, PC3  |
//! | SPI3     | 6  | PB3, PC10  | PB4, PC11  | PB5, PC12  |

use super::gpio::*;
use super::{SPI1, SPI2, SPI3};
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::spi::{self, Event, MisoPin, Mode, MosiPin, Phase, Polarity, SckPin, Status};

register_bitfields![u32,
    CR1 [
        SSM OFFSET(9) NUMBITS(1) [],
        SSI OFFSET(8) NUMBITS(1) [],
        LSBFIRST OFFSET(7) NUMBITS(1) [],
        SPE OFFSET(6) NUMBITS(1) [],
        BR OFFSET(3) NUMBITS(3) [],
        MSTR OFFSET(2) NUMBITS(1) [],
        CPOL OFFSET(1) NUMBITS(1) [],
        CPHA OFFSET(0) NUMBITS(1) []
    ],
    CR2 [
        TXEIE OFFSET(7) NUMBITS(1) [],
        RXNEIE OFFSET(6) NUMBITS(1) [],
        ERRIE OFFSET(5) NUMBITS(1) []
    ],
    SR [
        BSY OFFSET(7) NUMBITS(1) [],
        OVR OFFSET(6) NUMBITS(1) [],
        MODF OFFSET(5) NUMBITS(1) [],
        CRCERR OFFSET(4) NUMBITS(1) [],
        TXE OFFSET(1) NUMBITS(1) [],
        RXNE OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct SpiRegisters {
    cr1: ReadWrite<u32, CR1::Register>,
    cr2: ReadWrite<u32, CR2::Register>,
    sr: ReadWrite<u32, SR::Register>,
    dr: ReadWrite<u32>,
    crcpr: ReadWrite<u32>,
    rxcrcr: ReadWrite<u32>,
    txcrcr: ReadWrite<u32>,
    i2scfgr: ReadWrite<u32>,
    i2spr: ReadWrite<u32>,
}

impl spi::SpiRegisters for SpiRegisters {
    fn configure(&self, mode: Mode, br: u8) {
        self.cr2.set(0);
        self.cr1.write(
            CR1::CPHA.val((mode.phase == Phase::CaptureOnSecondTransition).into())
                + CR1::CPOL.val((mode.polarity == Polarity::IdleHigh).into())
                + CR1::MSTR::SET
                + CR1::BR.val(br.into())
                + CR1::SSM::SET
                + CR1::SSI::SET,
        );
        self.cr1.modify(CR1::SPE::SET);
    }

    fn disable(&self) {
        self.cr1.modify(CR1::SPE::CLEAR);
    }

    fn status(&self) -> Status {
        let sr = self.sr.extract();
        Status {
            rxne: sr.is_set(SR::RXNE),
            txe: sr.is_set(SR::TXE),
            crc_error: sr.is_set(SR::CRCERR),
            mode_fault: sr.is_set(SR::MODF),
            overrun: sr.is_set(SR::OVR),
            busy: sr.is_set(SR::BSY),
        }
    }

    fn clear_errors(&self) {
        let sr = self.sr.extract();
        if sr.is_set(SR::OVR) {
            self.dr.get();
            self.sr.get();
        }
        if sr.is_set(SR::MODF) {
            // MODF clears on the CR1 write after the status read
            self.cr1.modify(CR1::SPE::SET + CR1::MSTR::SET);
        }
        if sr.is_set(SR::CRCERR) {
            self.sr.modify(SR::CRCERR::CLEAR);
        }
    }

    fn read_data(&self) -> u8 {
        self.dr.get() as u8
    }

    fn write_data(&self, byte: u8) {
        self.dr.set(u32::from(byte));
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let bit = u32::from(enable);
        self.cr2.modify(match event {
            Event::Rxne => CR2::RXNEIE.val(bit),
            Event::Txe => CR2::TXEIE.val(bit),
            Event::Error => CR2::ERRIE.val(bit),
        });
    }
}

macro_rules! pins {
    ($($SPI:ident<$AF:literal>: SCK: [$($SCK:ident),+] MISO: [$($MISO:ident),+] MOSI: [$($MOSI:ident),+])+) => {
        $(
            $(impl SckPin<$SPI> for $SCK<Alternate<$AF>> {})+
            $(impl MisoPin<$SPI> for $MISO<Alternate<$AF>> {})+
            $(impl MosiPin<$SPI> for $MOSI<Alternate<$AF>> {})+
        )+
    };
}

pins! {
    SPI1<5>: SCK: [PA5, PB3] MISO: [PA6, PB4] MOSI: [PA7, PB5]
    SPI2<5>: SCK: [PB10, PB13] MISO: [PB14, PC2] MOSI: [PB15, PC3]
    SPI3<6>: SCK: [PB3, PC10] MISO: [PB4, PC11] MOSI: [PB5, PC12]
}

#[cfg(test)]
mod tests {
    use super::super::rcc::APB2;
    use super::*;
    use crate::clocks::Clocks;
    use crate::gpio::NoPin;
    use crate::gpio::disable_jtag;
    use crate::reg::{mock, Peripheral};
    use crate::spi::{Error, FullDuplex, Spi, MODE_3};
    use crate::time::Hertz;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(SpiRegisters, dr), 0x0C);
        assert_eq!(offset_of!(SpiRegisters, i2spr), 0x20);
    }

    #[test]
    fn master_setup_and_transfer() {
        let spi1 = unsafe { SPI1::at(mock::block()) };
        let regs = spi1.registers();
        let gpioa = gpioa::Parts::new(Port::mock());
        let sck = gpioa.pa5.into_alternate::<5>();
        let clocks = Clocks::new(
            Hertz(168_000_000),
            Hertz(168_000_000),
            Hertz(42_000_000),
            Hertz(84_000_000),
        );
        let mut apb2 = APB2::new(mock::block());

        let mut spi = Spi::new(spi1, (sck, NoPin, NoPin), MODE_3, Hertz(10_000_000), &clocks, &mut apb2);
        // 84 MHz / 16 = 5.25 MHz
        assert_eq!(mock::peek(regs, 0x00), 0b11 | 1 << 2 | 3 << 3 | 1 << 6 | 1 << 8 | 1 << 9);

        mock::poke(regs, 0x08, 1 << 1);
        assert_eq!(spi.send(0xA5), Ok(()));
        assert_eq!(mock::peek(regs, 0x0C), 0xA5);

        mock::poke(regs, 0x08, 1 << 0 | 1 << 6);
        assert_eq!(spi.read(), Err(nb::Error::Other(Error::Overrun)));
        mock::poke(regs, 0x08, 1 << 0);
        assert_eq!(spi.read(), Ok(0xA5));
    }

    #[test]
    fn spi1_on_the_jtag_pins() {
        let spi1 = unsafe { SPI1::at(mock::block()) };
        let regs = spi1.registers();
        let gpioa = gpioa::Parts::new(Port::mock());
        let gpiob = gpiob::Parts::new(Port::mock());
        let (_pa15, pb3, pb4) = disable_jtag(gpioa.pa15, gpiob.pb3, gpiob.pb4);
        let pins = (
            pb3.into_alternate::<5>(),
            pb4.into_alternate::<5>(),
            gpiob.pb5.into_alternate::<5>(),
        );
        let clocks = Clocks::new(
            Hertz(168_000_000),
            Hertz(168_000_000),
            Hertz(42_000_000),
            Hertz(84_000_000),
        );
        let mut apb2 = APB2::new(mock::block());
        let mut spi = Spi::new(spi1, pins, MODE_3, Hertz(42_000_000), &clocks, &mut apb2);
        // 84 MHz / 2
        assert_eq!(mock::peek(regs, 0x00), 0b11 | 1 << 2 | 1 << 6 | 1 << 8 | 1 << 9);

        mock::poke(regs, 0x08, 1 << 1);
        assert_eq!(spi.send(0x3C), Ok(()));
    }
}
