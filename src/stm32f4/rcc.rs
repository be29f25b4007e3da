// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Reset & Control Clock

use super::{
    CAN1, CAN2, CRC, GPIOA, GPIOB, GPIOC, GPIOD, GPIOE, GPIOF, GPIOG, GPIOH, GPIOI, RCC, RNG,
    SPI1, SPI2, SPI3, SYSCFG, UART4, UART5, USART1, USART2, USART3, USART6, WWDG,
};
use crate::clocks::{
    self, bus_plan, decode_buses, pll_search, BusLimits, Clocks, Error, PllLimits, Stage,
};
use crate::reg::{
    register_bitfields, wait_for, Peripheral, ReadOnly, ReadWrite, ReadWriteable, Readable,
    StaticRef, Writeable,
};
use crate::time::Hertz;

/// High speed internal oscillator
pub const HSI: Hertz = Hertz(16_000_000);
/// Crystal fitted to the STM32F4-Discovery
pub const HSE_VALUE: Hertz = Hertz(8_000_000);
/// Low speed internal oscillator, clocking the IWDG
pub const LSI: Hertz = Hertz(32_000);

pub const SYSCLK_MAX: u32 = 168_000_000;
pub const PCLK1_MAX: u32 = 42_000_000;
pub const PCLK2_MAX: u32 = 84_000_000;

/// Polls of a ready flag before giving up
const STARTUP_BUDGET: u32 = 0x0005_0000;

register_bitfields![u32,
    CR [
        PLLRDY OFFSET(25) NUMBITS(1) [],
        PLLON OFFSET(24) NUMBITS(1) [],
        CSSON OFFSET(19) NUMBITS(1) [],
        HSEBYP OFFSET(18) NUMBITS(1) [],
        HSERDY OFFSET(17) NUMBITS(1) [],
        HSEON OFFSET(16) NUMBITS(1) [],
        HSIRDY OFFSET(1) NUMBITS(1) [],
        HSION OFFSET(0) NUMBITS(1) []
    ],
    PLLCFGR [
        PLLQ OFFSET(24) NUMBITS(4) [],
        PLLSRC OFFSET(22) NUMBITS(1) [
            HSI = 0,
            HSE = 1
        ],
        PLLP OFFSET(16) NUMBITS(2) [],
        PLLN OFFSET(6) NUMBITS(9) [],
        PLLM OFFSET(0) NUMBITS(6) []
    ],
    RCC_CFGR [
        PPRE2 OFFSET(13) NUMBITS(3) [],
        PPRE1 OFFSET(10) NUMBITS(3) [],
        HPRE OFFSET(4) NUMBITS(4) [],
        SWS OFFSET(2) NUMBITS(2) [
            HSI = 0,
            HSE = 1,
            PLL = 2
        ],
        SW OFFSET(0) NUMBITS(2) [
            HSI = 0,
            HSE = 1,
            PLL = 2
        ]
    ],
    CSR [
        LSIRDY OFFSET(1) NUMBITS(1) [],
        LSION OFFSET(0) NUMBITS(1) []
    ],
    ACR [
        DCEN OFFSET(10) NUMBITS(1) [],
        ICEN OFFSET(9) NUMBITS(1) [],
        PRFTEN OFFSET(8) NUMBITS(1) [],
        LATENCY OFFSET(0) NUMBITS(3) []
    ]
];

#[repr(C)]
pub struct RccRegisters {
    cr: ReadWrite<u32, CR::Register>,
    pllcfgr: ReadWrite<u32, PLLCFGR::Register>,
    cfgr: ReadWrite<u32, RCC_CFGR::Register>,
    cir: ReadWrite<u32>,
    ahb1rstr: ReadWrite<u32>,
    ahb2rstr: ReadWrite<u32>,
    ahb3rstr: ReadWrite<u32>,
    _reserved0: [u8; 4],
    apb1rstr: ReadWrite<u32>,
    apb2rstr: ReadWrite<u32>,
    _reserved1: [u8; 8],
    ahb1enr: ReadWrite<u32>,
    ahb2enr: ReadWrite<u32>,
    ahb3enr: ReadWrite<u32>,
    _reserved2: [u8; 4],
    apb1enr: ReadWrite<u32>,
    apb2enr: ReadWrite<u32>,
    _reserved3: [u8; 0x2C],
    csr: ReadWrite<u32, CSR::Register>,
}

#[repr(C)]
pub struct FlashRegisters {
    acr: ReadWrite<u32, ACR::Register>,
    keyr: ReadWrite<u32>,
    optkeyr: ReadWrite<u32>,
    sr: ReadWrite<u32>,
    cr: ReadWrite<u32>,
    optcr: ReadOnly<u32>,
}

clocks::buses!(RccRegisters {
    /// AMBA High-performance Bus 1 (AHB1) registers
    AHB1 => (en: ahb1enr, rst: ahb1rstr, clk: hclk),
    /// AMBA High-performance Bus 2 (AHB2) registers
    AHB2 => (en: ahb2enr, rst: ahb2rstr, clk: hclk),
    /// Advanced Peripheral Bus 1 (APB1) registers
    APB1 => (en: apb1enr, rst: apb1rstr, clk: pclk1),
    /// Advanced Peripheral Bus 2 (APB2) registers
    APB2 => (en: apb2enr, rst: apb2rstr, clk: pclk2),
});

clocks::gate! {
    GPIOA => (AHB1, 0),
    GPIOB => (AHB1, 1),
    GPIOC => (AHB1, 2),
    GPIOD => (AHB1, 3),
    GPIOE => (AHB1, 4),
    GPIOF => (AHB1, 5),
    GPIOG => (AHB1, 6),
    GPIOH => (AHB1, 7),
    GPIOI => (AHB1, 8),
    CRC => (AHB1, 12),
    RNG => (AHB2, 6),
    WWDG => (APB1, 11),
    SPI2 => (APB1, 14),
    SPI3 => (APB1, 15),
    USART2 => (APB1, 17),
    USART3 => (APB1, 18),
    UART4 => (APB1, 19),
    UART5 => (APB1, 20),
    CAN1 => (APB1, 25),
    CAN2 => (APB1, 26),
    USART1 => (APB2, 4),
    USART6 => (APB2, 5),
    SPI1 => (APB2, 12),
    SYSCFG => (APB2, 14),
}

clocks::reset! {
    GPIOA => 0,
    GPIOB => 1,
    GPIOC => 2,
    GPIOD => 3,
    GPIOE => 4,
    GPIOF => 5,
    GPIOG => 6,
    GPIOH => 7,
    GPIOI => 8,
    CRC => 12,
    RNG => 6,
    WWDG => 11,
    SPI2 => 14,
    SPI3 => 15,
    USART2 => 17,
    USART3 => 18,
    UART4 => 19,
    UART5 => 20,
    CAN1 => 25,
    CAN2 => 26,
    USART1 => 4,
    USART6 => 5,
    SPI1 => 12,
    SYSCFG => 14,
}

const PLL_LIMITS: PllLimits = PllLimits {
    m: (2, 63),
    n: (50, 432),
    p: &[2, 4, 6, 8],
    vco_in: (1_000_000, 2_000_000),
    vco_out: (100_000_000, 432_000_000),
};

const BUS_LIMITS: BusLimits = BusLimits {
    hclk: SYSCLK_MAX,
    pclk1: PCLK1_MAX,
    pclk2: PCLK2_MAX,
};

/// Extension trait that constrains the `RCC` peripheral
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcc;
}

impl RccExt for RCC {
    fn constrain(self) -> Rcc {
        let regs = self.registers();
        Rcc {
            ahb1: AHB1::new(regs),
            ahb2: AHB2::new(regs),
            apb1: APB1::new(regs),
            apb2: APB2::new(regs),
            cfgr: CFGR {
                regs,
                hse: None,
                bypass: false,
                sysclk: None,
                hclk: None,
                pclk1: None,
                pclk2: None,
            },
        }
    }
}

impl RCC {
    /// Derives the running clock frequencies from the clock registers
    ///
    /// `hse` is the frequency of the external crystal or clock, if fitted.
    pub fn clocks(&self, hse: Hertz) -> Clocks {
        read_clocks(&self.registers(), hse)
    }

    /// Starts the LSI and waits for it to settle
    pub fn enable_lsi(&mut self) -> Result<(), Error> {
        let regs = self.registers();
        regs.csr.modify(CSR::LSION::SET);
        wait_for(STARTUP_BUDGET, || regs.csr.is_set(CSR::LSIRDY))
            .map_err(|_| Error::Timeout(Stage::Internal))
    }
}

/// Constrained RCC peripheral
pub struct Rcc {
    /// AMBA High-performance Bus 1 (AHB1) registers
    pub ahb1: AHB1,
    /// AMBA High-performance Bus 2 (AHB2) registers
    pub ahb2: AHB2,
    /// Advanced Peripheral Bus 1 (APB1) registers
    pub apb1: APB1,
    /// Advanced Peripheral Bus 2 (APB2) registers
    pub apb2: APB2,
    /// Clock configuration
    pub cfgr: CFGR,
}

/// System clock from a PLL configuration, as `SystemCoreClockUpdate` computes it
pub const fn pll_sysclk(src: u32, m: u32, n: u32, p_bits: u32) -> u32 {
    if m == 0 {
        return 0;
    }
    src / m * n / ((p_bits + 1) * 2)
}

/// Reads back the clock tree
pub fn read_clocks(rcc: &RccRegisters, hse: Hertz) -> Clocks {
    let sysclk = match rcc.cfgr.read_as_enum(RCC_CFGR::SWS) {
        Some(RCC_CFGR::SWS::Value::HSE) => hse.0,
        Some(RCC_CFGR::SWS::Value::PLL) => {
            let src = match rcc.pllcfgr.read_as_enum(PLLCFGR::PLLSRC) {
                Some(PLLCFGR::PLLSRC::Value::HSE) => hse.0,
                _ => HSI.0,
            };
            pll_sysclk(
                src,
                rcc.pllcfgr.read(PLLCFGR::PLLM),
                rcc.pllcfgr.read(PLLCFGR::PLLN),
                rcc.pllcfgr.read(PLLCFGR::PLLP),
            )
        }
        _ => HSI.0,
    };
    decode_buses(
        sysclk,
        rcc.cfgr.read(RCC_CFGR::HPRE),
        rcc.cfgr.read(RCC_CFGR::PPRE1),
        rcc.cfgr.read(RCC_CFGR::PPRE2),
    )
}

/// Flash wait states for an AHB frequency at 2.7 to 3.6 V
pub const fn flash_latency(hclk: u32) -> u32 {
    hclk.saturating_sub(1) / 30_000_000
}

/// Everything `freeze` programs, computed up front
#[derive(Clone, Copy, Debug, PartialEq)]
struct Plan {
    src: Hertz,
    /// `(m, n, p, q)`
    pll: Option<(u32, u32, u32, u32)>,
    hpre: u32,
    ppre1: u32,
    ppre2: u32,
    latency: u32,
    clocks: Clocks,
}

/// Clock configuration builder
pub struct CFGR {
    regs: StaticRef<RccRegisters>,
    hse: Option<Hertz>,
    bypass: bool,
    sysclk: Option<Hertz>,
    hclk: Option<Hertz>,
    pclk1: Option<Hertz>,
    pclk2: Option<Hertz>,
}

impl CFGR {
    /// Uses an external oscillator instead of the HSI
    pub fn use_hse<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hse = Some(freq.into());
        self
    }

    /// The external clock is driven by an oscillator, not a crystal
    pub fn bypass_hse_oscillator(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Sets the desired frequency for the SYSCLK clock
    pub fn sysclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.sysclk = Some(freq.into());
        self
    }

    /// Sets the desired frequency for the HCLK clock
    pub fn hclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hclk = Some(freq.into());
        self
    }

    /// Sets the desired frequency for the PCKL1 clock
    pub fn pclk1<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk1 = Some(freq.into());
        self
    }

    /// Sets the desired frequency for the PCLK2 clock
    pub fn pclk2<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk2 = Some(freq.into());
        self
    }

    fn plan(&self) -> Result<Plan, Error> {
        let src = self.hse.unwrap_or(HSI);
        let sysclk = self.sysclk.unwrap_or(src).0;
        if sysclk > SYSCLK_MAX {
            return Err(Error::PllUnreachable);
        }

        let pll = if sysclk == src.0 {
            None
        } else {
            let f = pll_search(src.0, sysclk, &PLL_LIMITS)?;
            // USB/SDIO/RNG clock as close to 48 MHz as it gets from above
            let q = ((f.vco(src.0) + 47_999_999) / 48_000_000).clamp(2, 15);
            Some((f.m, f.n, f.p, q))
        };

        let buses = bus_plan(
            sysclk,
            self.hclk.map(|f| f.0),
            self.pclk1.map(|f| f.0),
            self.pclk2.map(|f| f.0),
            &BUS_LIMITS,
        )?;
        let (hpre, ppre1, ppre2) = buses.bits();

        Ok(Plan {
            src,
            pll,
            hpre,
            ppre1,
            ppre2,
            latency: flash_latency(buses.clocks.hclk().0),
            clocks: buses.clocks,
        })
    }

    /// Applies the clock configuration and returns the frozen frequencies
    pub fn freeze(self, flash: &super::FLASH) -> Result<Clocks, Error> {
        let plan = self.plan()?;
        let rcc = self.regs;

        if self.hse.is_some() {
            rcc.cr.modify(if self.bypass {
                CR::HSEBYP::SET
            } else {
                CR::HSEBYP::CLEAR
            });
            rcc.cr.modify(CR::HSEON::SET);
            wait_for(STARTUP_BUDGET, || rcc.cr.is_set(CR::HSERDY))
                .map_err(|_| Error::Timeout(Stage::External))?;
        } else {
            rcc.cr.modify(CR::HSION::SET);
            wait_for(STARTUP_BUDGET, || rcc.cr.is_set(CR::HSIRDY))
                .map_err(|_| Error::Timeout(Stage::Internal))?;
        }

        // wait states first, the core may speed up below
        flash.registers().acr.write(
            ACR::LATENCY.val(plan.latency) + ACR::PRFTEN::SET + ACR::ICEN::SET + ACR::DCEN::SET,
        );

        let sw = if let Some((m, n, p, q)) = plan.pll {
            let src = if self.hse.is_some() {
                PLLCFGR::PLLSRC::HSE
            } else {
                PLLCFGR::PLLSRC::HSI
            };
            rcc.pllcfgr.write(
                PLLCFGR::PLLM.val(m)
                    + PLLCFGR::PLLN.val(n)
                    + PLLCFGR::PLLP.val(p / 2 - 1)
                    + PLLCFGR::PLLQ.val(q)
                    + src,
            );
            rcc.cr.modify(CR::PLLON::SET);
            wait_for(STARTUP_BUDGET, || rcc.cr.is_set(CR::PLLRDY))
                .map_err(|_| Error::Timeout(Stage::Pll))?;
            RCC_CFGR::SW::Value::PLL as u32
        } else if self.hse.is_some() {
            RCC_CFGR::SW::Value::HSE as u32
        } else {
            RCC_CFGR::SW::Value::HSI as u32
        };

        rcc.cfgr.modify(
            RCC_CFGR::HPRE.val(plan.hpre)
                + RCC_CFGR::PPRE1.val(plan.ppre1)
                + RCC_CFGR::PPRE2.val(plan.ppre2),
        );
        rcc.cfgr.modify(RCC_CFGR::SW.val(sw));
        wait_for(STARTUP_BUDGET, || rcc.cfgr.read(RCC_CFGR::SWS) == sw)
            .map_err(|_| Error::Timeout(Stage::Switch))?;

        Ok(plan.clocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::mock;
    use crate::time::U32Ext;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(RccRegisters, cfgr), 0x08);
        assert_eq!(offset_of!(RccRegisters, apb1rstr), 0x20);
        assert_eq!(offset_of!(RccRegisters, ahb1enr), 0x30);
        assert_eq!(offset_of!(RccRegisters, apb2enr), 0x44);
        assert_eq!(offset_of!(RccRegisters, csr), 0x74);
        assert_eq!(offset_of!(FlashRegisters, optcr), 0x14);
    }

    #[test]
    fn system_core_clock_from_registers() {
        let regs = mock::block::<RccRegisters>();
        // reset state: HSI, no dividers
        assert_eq!(read_clocks(&regs, HSE_VALUE).sysclk(), HSI);

        // HSE 8 MHz / 8 * 336 / 2, AHB /1, APB1 /4, APB2 /2
        mock::poke(regs, 0x04, 8 | 336 << 6 | 1 << 22 | 7 << 24);
        mock::poke(regs, 0x08, 0b10 << 2 | 0b101 << 10 | 0b100 << 13);
        let clocks = read_clocks(&regs, HSE_VALUE);
        assert_eq!(clocks.sysclk(), Hertz(168_000_000));
        assert_eq!(clocks.hclk(), Hertz(168_000_000));
        assert_eq!(clocks.pclk1(), Hertz(42_000_000));
        assert_eq!(clocks.pclk2(), Hertz(84_000_000));

        // PLL from HSI 16 MHz / 16 * 336 / 4
        mock::poke(regs, 0x04, 16 | 336 << 6 | 1 << 16);
        assert_eq!(read_clocks(&regs, HSE_VALUE).sysclk(), Hertz(84_000_000));
    }

    fn cfgr() -> CFGR {
        let rcc = unsafe { RCC::at(mock::block()) };
        rcc.constrain().cfgr
    }

    #[test]
    fn plan_for_the_discovery_board() {
        let plan = cfgr().use_hse(8_000_000.hz()).sysclk(168_000_000.hz()).plan().unwrap();
        assert_eq!(plan.pll, Some((4, 168, 2, 7)));
        assert_eq!((plan.hpre, plan.ppre1, plan.ppre2), (0b0000, 0b101, 0b100));
        assert_eq!(plan.latency, 5);
        assert_eq!(plan.clocks.pclk1(), Hertz(42_000_000));
    }

    #[test]
    fn plan_without_pll() {
        let plan = cfgr().plan().unwrap();
        assert_eq!(plan.pll, None);
        assert_eq!(plan.src, HSI);
        assert_eq!(plan.latency, 0);
        assert_eq!(plan.clocks.sysclk(), HSI);
    }

    #[test]
    fn out_of_range_requests() {
        assert_eq!(
            cfgr().sysclk(180_000_000.hz()).plan(),
            Err(Error::PllUnreachable)
        );
        assert_eq!(
            cfgr().sysclk(168_000_000.hz()).pclk2(168_000_000.hz()).plan(),
            Err(Error::BusTooFast)
        );
    }

    #[test]
    fn freeze_programs_the_pll() {
        let rcc = unsafe { RCC::at(mock::block()) };
        let flash = unsafe { super::super::FLASH::at(mock::block()) };
        let regs = rcc.registers();
        // the mock hardware reports ready and the PLL as system clock
        mock::poke(regs, 0x00, 1 << 17 | 1 << 25);
        mock::poke(regs, 0x08, 0b10 << 2);

        let clocks = rcc
            .constrain()
            .cfgr
            .use_hse(8_000_000.hz())
            .sysclk(168_000_000.hz())
            .freeze(&flash)
            .unwrap();
        assert_eq!(clocks.sysclk(), Hertz(168_000_000));
        assert_eq!(mock::peek(regs, 0x04), 4 | 168 << 6 | 1 << 22 | 7 << 24);
        assert_eq!(mock::peek(regs, 0x08) & 0x3, 0b10);
        assert_eq!(mock::peek(regs, 0x00) & (1 << 16 | 1 << 24), 1 << 16 | 1 << 24);
        assert_eq!(mock::peek(flash.registers(), 0x00), 5 | 0x700);
    }

    #[test]
    fn freeze_times_out_on_a_dead_crystal() {
        let rcc = unsafe { RCC::at(mock::block()) };
        let flash = unsafe { super::super::FLASH::at(mock::block()) };
        let result = rcc
            .constrain()
            .cfgr
            .use_hse(8_000_000.hz())
            .sysclk(168_000_000.hz())
            .freeze(&flash);
        assert_eq!(result, Err(Error::Timeout(Stage::External)));
    }

    #[test]
    fn gating_and_reset() {
        use crate::clocks::{Enable, Reset};
        let rcc = unsafe { RCC::at(mock::block()) };
        let regs = rcc.registers();
        let mut parts = rcc.constrain();
        USART2::enable(&mut parts.apb1);
        GPIOD::enable(&mut parts.ahb1);
        assert!(USART2::is_enabled(&parts.apb1));
        assert_eq!(mock::peek(regs, 0x40), 1 << 17);
        assert_eq!(mock::peek(regs, 0x30), 1 << 3);
        GPIOD::reset(&mut parts.ahb1);
        assert_eq!(mock::peek(regs, 0x10), 0);
        USART2::disable(&mut parts.apb1);
        assert!(!USART2::is_enabled(&parts.apb1));
    }
}
