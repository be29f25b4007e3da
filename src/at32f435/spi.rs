// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SPI registers and pin routing
//!
//! Only the power-of-two dividers of `MDIV` are used; the /3 and the
//! extended dividers above 256 stay off.

use super::gpio::*;
use super::{SPI1, SPI2, SPI3};
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::spi::{self, Event, MisoPin, Mode, MosiPin, Phase, Polarity, SckPin, Status};

register_bitfields![u32,
    CTRL1 [
        SWCSEN OFFSET(9) NUMBITS(1) [],
        SWCSIL OFFSET(8) NUMBITS(1) [],
        LTF OFFSET(7) NUMBITS(1) [],
        SPIEN OFFSET(6) NUMBITS(1) [],
        MDIV OFFSET(3) NUMBITS(3) [],
        MSTEN OFFSET(2) NUMBITS(1) [],
        CLKPOL OFFSET(1) NUMBITS(1) [],
        CLKPHA OFFSET(0) NUMBITS(1) []
    ],
    CTRL2 [
        MDIV3EN OFFSET(9) NUMBITS(1) [],
        MDIV_H OFFSET(8) NUMBITS(1) [],
        TDBEIE OFFSET(7) NUMBITS(1) [],
        RDBFIE OFFSET(6) NUMBITS(1) [],
        ERRIE OFFSET(5) NUMBITS(1) []
    ],
    STS [
        BF OFFSET(7) NUMBITS(1) [],
        ROERR OFFSET(6) NUMBITS(1) [],
        MMERR OFFSET(5) NUMBITS(1) [],
        CCERR OFFSET(4) NUMBITS(1) [],
        TDBE OFFSET(1) NUMBITS(1) [],
        RDBF OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct SpiRegisters {
    ctrl1: ReadWrite<u32, CTRL1::Register>,
    ctrl2: ReadWrite<u32, CTRL2::Register>,
    sts: ReadWrite<u32, STS::Register>,
    dt: ReadWrite<u32>,
    cpoly: ReadWrite<u32>,
    rcrc: ReadWrite<u32>,
    tcrc: ReadWrite<u32>,
    i2sctrl: ReadWrite<u32>,
    i2sclk: ReadWrite<u32>,
}

impl spi::SpiRegisters for SpiRegisters {
    fn configure(&self, mode: Mode, br: u8) {
        self.ctrl2.set(0);
        self.ctrl1.write(
            CTRL1::MSTEN::SET
                + CTRL1::SWCSEN::SET
                + CTRL1::SWCSIL::SET
                + CTRL1::MDIV.val(br.into())
                + CTRL1::CLKPOL.val((mode.polarity == Polarity::IdleHigh).into())
                + CTRL1::CLKPHA.val((mode.phase == Phase::CaptureOnSecondTransition).into()),
        );
        self.ctrl1.modify(CTRL1::SPIEN::SET);
    }

    fn disable(&self) {
        self.ctrl1.modify(CTRL1::SPIEN::CLEAR);
    }

    fn status(&self) -> Status {
        let sts = self.sts.extract();
        Status {
            rxne: sts.is_set(STS::RDBF),
            txe: sts.is_set(STS::TDBE),
            crc_error: sts.is_set(STS::CCERR),
            mode_fault: sts.is_set(STS::MMERR),
            overrun: sts.is_set(STS::ROERR),
            busy: sts.is_set(STS::BF),
        }
    }

    fn clear_errors(&self) {
        let sts = self.sts.extract();
        if sts.is_set(STS::ROERR) {
            self.dt.get();
            self.sts.get();
        }
        if sts.is_set(STS::MMERR) {
            // a CTRL1 write after the STS read clears MMERR
            self.ctrl1.modify(CTRL1::MSTEN::SET + CTRL1::SPIEN::SET);
        }
        if sts.is_set(STS::CCERR) {
            self.sts.modify(STS::CCERR::CLEAR);
        }
    }

    fn read_data(&self) -> u8 {
        self.dt.get() as u8
    }

    fn write_data(&self, byte: u8) {
        self.dt.set(byte.into());
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let field = match event {
            Event::Rxne => CTRL2::RDBFIE,
            Event::Txe => CTRL2::TDBEIE,
            Event::Error => CTRL2::ERRIE,
        };
        self.ctrl2.modify(field.val(enable.into()));
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
    SPI2<5>: SCK: [PB10, PB13, PD3] MISO: [PB14, PC2] MOSI: [PB15, PC3]
    SPI3<6>: SCK: [PB3, PC10] MISO: [PB4, PC11] MOSI: [PB5, PC12]
}

#[cfg(test)]
mod tests {
    use super::super::crm::APB2;
    use super::*;
    use crate::clocks::Clocks;
    use crate::gpio::NoPin;
    use crate::gpio::disable_jtag;
    use crate::reg::{mock, Peripheral};
    use crate::spi::{Error, FullDuplex, Spi, MODE_1};
    use crate::time::Hertz;

    #[test]
    fn spi1_write_only() {
        let spi1 = unsafe { SPI1::at(mock::block()) };
        let regs = spi1.registers();
        let gpioa = gpioa::Parts::new(Port::mock());
        let pins = (gpioa.pa5.into_alternate::<5>(), NoPin, gpioa.pa7.into_alternate::<5>());
        let clocks = Clocks::new(
            Hertz(288_000_000),
            Hertz(288_000_000),
            Hertz(144_000_000),
            Hertz(144_000_000),
        );
        let crm = mock::block();
        let mut spi = Spi::new(spi1, pins, MODE_1, Hertz(18_000_000), &clocks, &mut APB2::new(crm));
        assert_eq!(mock::peek(crm, 0x44), 1 << 12);
        // 144 MHz / 8
        assert_eq!(mock::peek(regs, 0x00), 1 | 1 << 2 | 2 << 3 | 1 << 6 | 1 << 8 | 1 << 9);

        mock::poke(regs, 0x08, 0b10);
        assert_eq!(spi.send(0x5A), Ok(()));
        assert_eq!(mock::peek(regs, 0x0C), 0x5A);

        mock::poke(regs, 0x08, 1 << 6);
        assert_eq!(spi.read(), Err(nb::Error::Other(Error::Overrun)));
    }

    #[test]
    fn spi1_on_the_jtag_pins() {
        let spi1 = unsafe { SPI1::at(mock::block()) };
        let gpioa = gpioa::Parts::new(Port::mock());
        let gpiob = gpiob::Parts::new(Port::mock());
        let (_pa15, pb3, pb4) = disable_jtag(gpioa.pa15, gpiob.pb3, gpiob.pb4);
        let pins = (pb3.into_alternate::<5>(), pb4.into_alternate::<5>(), NoPin);
        let clocks = Clocks::new(
            Hertz(288_000_000),
            Hertz(288_000_000),
            Hertz(144_000_000),
            Hertz(144_000_000),
        );
        let crm = mock::block();
        let spi = Spi::new(spi1, pins, MODE_1, Hertz(18_000_000), &clocks, &mut APB2::new(crm));
        assert_eq!(mock::peek(crm, 0x44), 1 << 12);
        let (_spi1, (_sck, _miso, _mosi)) = spi.release();
    }
}
