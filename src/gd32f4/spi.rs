// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SPI registers and pin routing
//!
//! | Instance | AF | SCK                 | MISO            | MOSI            |
//! |----------|----|---------------------|-----------------|-----------------|
//! | SPI0     | 5  | PA5, PB3            | PA6, PB4        | PA7, PB5        |
//! | SPI1     | 5  | PB10, PB13, PD3, PI1| PB14, PC2, PI2  | PB15, PC3, PI3  |
//! | SPI2     | 6  | PB3, PC10           | PB4, PC11       | PB5, PC12       |

use super::gpio::*;
use super::{SPI0, SPI1, SPI2};
use crate::gpio::Alternate;
use crate::reg::{register_bitfields, ReadWrite, ReadWriteable, Readable, Writeable};
use crate::spi::{self, Event, MisoPin, Mode, MosiPin, Phase, Polarity, SckPin, Status};

register_bitfields![u32,
    CTL0 [
        SWNSSEN OFFSET(9) NUMBITS(1) [],
        SWNSS OFFSET(8) NUMBITS(1) [],
        LF OFFSET(7) NUMBITS(1) [],
        SPIEN OFFSET(6) NUMBITS(1) [],
        PSC OFFSET(3) NUMBITS(3) [],
        MSTMOD OFFSET(2) NUMBITS(1) [],
        CKPL OFFSET(1) NUMBITS(1) [],
        CKPH OFFSET(0) NUMBITS(1) []
    ],
    CTL1 [
        TBEIE OFFSET(7) NUMBITS(1) [],
        RBNEIE OFFSET(6) NUMBITS(1) [],
        ERRIE OFFSET(5) NUMBITS(1) []
    ],
    STAT [
        TRANS OFFSET(7) NUMBITS(1) [],
        RXORERR OFFSET(6) NUMBITS(1) [],
        CONFERR OFFSET(5) NUMBITS(1) [],
        CRCERR OFFSET(4) NUMBITS(1) [],
        TBE OFFSET(1) NUMBITS(1) [],
        RBNE OFFSET(0) NUMBITS(1) []
    ]
];

#[repr(C)]
pub struct SpiRegisters {
    ctl0: ReadWrite<u32, CTL0::Register>,
    ctl1: ReadWrite<u32, CTL1::Register>,
    stat: ReadWrite<u32, STAT::Register>,
    data: ReadWrite<u32>,
    crcpoly: ReadWrite<u32>,
    rcrc: ReadWrite<u32>,
    tcrc: ReadWrite<u32>,
    i2sctl: ReadWrite<u32>,
    i2spsc: ReadWrite<u32>,
}

impl spi::SpiRegisters for SpiRegisters {
    fn configure(&self, mode: Mode, br: u8) {
        self.ctl1.set(0);
        // software NSS held high keeps the master out of CONFERR
        self.ctl0.write(
            CTL0::MSTMOD::SET
                + CTL0::SWNSSEN::SET
                + CTL0::SWNSS::SET
                + CTL0::PSC.val(br.into())
                + CTL0::CKPL.val((mode.polarity == Polarity::IdleHigh).into())
                + CTL0::CKPH.val((mode.phase == Phase::CaptureOnSecondTransition).into()),
        );
        self.ctl0.modify(CTL0::SPIEN::SET);
    }

    fn disable(&self) {
        self.ctl0.modify(CTL0::SPIEN::CLEAR);
    }

    fn status(&self) -> Status {
        let stat = self.stat.extract();
        Status {
            rxne: stat.is_set(STAT::RBNE),
            txe: stat.is_set(STAT::TBE),
            crc_error: stat.is_set(STAT::CRCERR),
            mode_fault: stat.is_set(STAT::CONFERR),
            overrun: stat.is_set(STAT::RXORERR),
            busy: stat.is_set(STAT::TRANS),
        }
    }

    fn clear_errors(&self) {
        let stat = self.stat.extract();
        if stat.is_set(STAT::RXORERR) {
            self.data.get();
            self.stat.get();
        }
        if stat.is_set(STAT::CONFERR) {
            self.ctl0.modify(CTL0::MSTMOD::SET + CTL0::SPIEN::SET);
        }
        if stat.is_set(STAT::CRCERR) {
            self.stat.modify(STAT::CRCERR::CLEAR);
        }
    }

    fn read_data(&self) -> u8 {
        self.data.get() as u8
    }

    fn write_data(&self, byte: u8) {
        self.data.set(byte.into());
    }

    fn set_interrupt(&self, event: Event, enable: bool) {
        let field = match event {
            Event::Rxne => CTL1::RBNEIE,
            Event::Txe => CTL1::TBEIE,
            Event::Error => CTL1::ERRIE,
        };
        self.ctl1.modify(field.val(enable.into()));
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
    SPI0<5>: SCK: [PA5, PB3] MISO: [PA6, PB4] MOSI: [PA7, PB5]
    SPI1<5>: SCK: [PB10, PB13, PD3, PI1] MISO: [PB14, PC2, PI2] MOSI: [PB15, PC3, PI3]
    SPI2<6>: SCK: [PB3, PC10] MISO: [PB4, PC11] MOSI: [PB5, PC12]
}

#[cfg(test)]
mod tests {
    use super::super::rcu::APB1;
    use super::super::rcu::APB2;
    use crate::gpio::{disable_jtag, NoPin};
    use super::*;
    use crate::clocks::Clocks;
    use crate::reg::{mock, Peripheral};
    use crate::spi::{Error, FullDuplex, Spi, MODE_0};
    use crate::time::Hertz;
    use embedded_hal::blocking::spi::Transfer;

    #[test]
    fn flash_on_spi1() {
        let spi1 = unsafe { SPI1::at(mock::block()) };
        let regs = spi1.registers();
        let gpiob = gpiob::Parts::new(Port::mock());
        let pins = (
            gpiob.pb13.into_alternate::<5>(),
            gpiob.pb14.into_alternate::<5>(),
            gpiob.pb15.into_alternate::<5>(),
        );
        let clocks = Clocks::new(
            Hertz(200_000_000),
            Hertz(200_000_000),
            Hertz(50_000_000),
            Hertz(100_000_000),
        );
        let rcu = mock::block();
        let mut spi = Spi::new(spi1, pins, MODE_0, Hertz(20_000_000), &clocks, &mut APB1::new(rcu));
        assert_eq!(mock::peek(rcu, 0x40), 1 << 14);
        // 50 MHz / 4
        assert_eq!(mock::peek(regs, 0x00), 1 << 2 | 1 << 3 | 1 << 6 | 1 << 8 | 1 << 9);

        // the mock data register loops every byte back
        mock::poke(regs, 0x08, 0b11);
        let mut words = [0x9F, 0x00];
        assert_eq!(spi.transfer(&mut words), Ok(&[0x9F, 0x00][..]));

        mock::poke(regs, 0x08, 1 << 5);
        assert_eq!(spi.read(), Err(nb::Error::Other(Error::ModeFault)));
    }

    #[test]
    fn spi0_on_the_jtag_pins() {
        let spi0 = unsafe { SPI0::at(mock::block()) };
        let regs = spi0.registers();
        let gpioa = gpioa::Parts::new(Port::mock());
        let gpiob = gpiob::Parts::new(Port::mock());
        let (_pa15, pb3, pb4) = disable_jtag(gpioa.pa15, gpiob.pb3, gpiob.pb4);
        let pins = (pb3.into_alternate::<5>(), pb4.into_alternate::<5>(), NoPin);
        let clocks = Clocks::new(
            Hertz(200_000_000),
            Hertz(200_000_000),
            Hertz(50_000_000),
            Hertz(100_000_000),
        );
        let rcu = mock::block();
        let mut spi = Spi::new(spi0, pins, MODE_0, Hertz(50_000_000), &clocks, &mut APB2::new(rcu));
        // 100 MHz / 2
        assert_eq!(mock::peek(regs, 0x00), 1 << 2 | 1 << 6 | 1 << 8 | 1 << 9);

        mock::poke(regs, 0x08, 1 << 0);
        assert_eq!(spi.read(), Ok(0));
    }
}
