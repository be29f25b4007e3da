// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Reset and clock unit
//!
//! Above 168 MHz the core domain needs the PMU high-drive mode; `freeze`
//! switches it on before selecting the PLL.

use super::{
    CAN0, CAN1, CRC, FWDGT, GPIOA, GPIOB, GPIOC, GPIOD, GPIOE, GPIOF, GPIOG, GPIOH, GPIOI, RCU,
    SPI0, SPI1, SPI2, SYSCFG, TRNG, UART3, UART4, USART0, USART1, USART2, USART5, WWDGT,
};
use crate::clocks::{
    self, bus_plan, decode_buses, pll_search, BusLimits, Clocks, Error, PllLimits, Stage,
};
use crate::reg::{
    register_bitfields, wait_for, Peripheral, ReadWrite, ReadWriteable, Readable, StaticRef,
    Writeable,
};
use crate::time::Hertz;

/// Internal 16 MHz RC oscillator
pub const IRC16M: Hertz = Hertz(16_000_000);
/// Crystal fitted to the GD32450I-EVAL
pub const HXTAL_VALUE: Hertz = Hertz(25_000_000);
/// Internal 32 kHz RC oscillator, clocking the FWDGT
pub const IRC32K: Hertz = Hertz(32_000);

pub const CK_SYS_MAX: u32 = 200_000_000;
pub const CK_APB1_MAX: u32 = 50_000_000;
pub const CK_APB2_MAX: u32 = 100_000_000;

/// System clock above which the high-drive mode is required
const HIGH_DRIVE_THRESHOLD: u32 = 168_000_000;

/// PMU clock enable in RCU_APB1EN
const PMUEN: u8 = 28;

const STARTUP_BUDGET: u32 = 0x0000_FFFF;

register_bitfields![u32,
    CTL [
        PLLSTB OFFSET(25) NUMBITS(1) [],
        PLLEN OFFSET(24) NUMBITS(1) [],
        CKMEN OFFSET(19) NUMBITS(1) [],
        HXTALBPS OFFSET(18) NUMBITS(1) [],
        HXTALSTB OFFSET(17) NUMBITS(1) [],
        HXTALEN OFFSET(16) NUMBITS(1) [],
        IRC16MSTB OFFSET(1) NUMBITS(1) [],
        IRC16MEN OFFSET(0) NUMBITS(1) []
    ],
    PLL [
        PLLQ OFFSET(24) NUMBITS(4) [],
        PLLSEL OFFSET(22) NUMBITS(1) [
            IRC16M = 0,
            HXTAL = 1
        ],
        PLLP OFFSET(16) NUMBITS(2) [],
        PLLN OFFSET(6) NUMBITS(9) [],
        PLLPSC OFFSET(0) NUMBITS(6) []
    ],
    CFG0 [
        APB2PSC OFFSET(13) NUMBITS(3) [],
        APB1PSC OFFSET(10) NUMBITS(3) [],
        AHBPSC OFFSET(4) NUMBITS(4) [],
        SCSS OFFSET(2) NUMBITS(2) [
            IRC16M = 0,
            HXTAL = 1,
            PLLP = 2
        ],
        SCS OFFSET(0) NUMBITS(2) [
            IRC16M = 0,
            HXTAL = 1,
            PLLP = 2
        ]
    ],
    RSTSCK [
        IRC32KSTB OFFSET(1) NUMBITS(1) [],
        IRC32KEN OFFSET(0) NUMBITS(1) []
    ],
    PMU_CTL [
        HDS OFFSET(17) NUMBITS(1) [],
        HDEN OFFSET(16) NUMBITS(1) [],
        LDOVS OFFSET(14) NUMBITS(2) []
    ],
    PMU_CS [
        HDSRF OFFSET(17) NUMBITS(1) [],
        HDRF OFFSET(16) NUMBITS(1) []
    ],
    WS [
        WSCNT OFFSET(0) NUMBITS(4) []
    ]
];

#[repr(C)]
pub struct RcuRegisters {
    ctl: ReadWrite<u32, CTL::Register>,
    pll: ReadWrite<u32, PLL::Register>,
    cfg0: ReadWrite<u32, CFG0::Register>,
    int: ReadWrite<u32>,
    ahb1rst: ReadWrite<u32>,
    ahb2rst: ReadWrite<u32>,
    ahb3rst: ReadWrite<u32>,
    _reserved0: [u8; 4],
    apb1rst: ReadWrite<u32>,
    apb2rst: ReadWrite<u32>,
    _reserved1: [u8; 8],
    ahb1en: ReadWrite<u32>,
    ahb2en: ReadWrite<u32>,
    ahb3en: ReadWrite<u32>,
    _reserved2: [u8; 4],
    apb1en: ReadWrite<u32>,
    apb2en: ReadWrite<u32>,
    _reserved3: [u8; 0x2C],
    rstsck: ReadWrite<u32, RSTSCK::Register>,
}

/// Power management unit, only the high-drive controls
#[repr(C)]
pub struct PmuRegisters {
    ctl: ReadWrite<u32, PMU_CTL::Register>,
    cs: ReadWrite<u32, PMU_CS::Register>,
}

/// Flash memory controller, only the wait state register
#[repr(C)]
pub struct FmcRegisters {
    ws: ReadWrite<u32, WS::Register>,
}

clocks::buses!(RcuRegisters {
    AHB1 => (en: ahb1en, rst: ahb1rst, clk: hclk),
    AHB2 => (en: ahb2en, rst: ahb2rst, clk: hclk),
    APB1 => (en: apb1en, rst: apb1rst, clk: pclk1),
    APB2 => (en: apb2en, rst: apb2rst, clk: pclk2),
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
    TRNG => (AHB2, 6),
    WWDGT => (APB1, 11),
    SPI1 => (APB1, 14),
    SPI2 => (APB1, 15),
    USART1 => (APB1, 17),
    USART2 => (APB1, 18),
    UART3 => (APB1, 19),
    UART4 => (APB1, 20),
    CAN0 => (APB1, 25),
    CAN1 => (APB1, 26),
    USART0 => (APB2, 4),
    USART5 => (APB2, 5),
    SPI0 => (APB2, 12),
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
    TRNG => 6,
    WWDGT => 11,
    SPI1 => 14,
    SPI2 => 15,
    USART1 => 17,
    USART2 => 18,
    UART3 => 19,
    UART4 => 20,
    CAN0 => 25,
    CAN1 => 26,
    USART0 => 4,
    USART5 => 5,
    SPI0 => 12,
    SYSCFG => 14,
}

const PLL_LIMITS: PllLimits = PllLimits {
    m: (2, 63),
    n: (64, 500),
    p: &[2, 4, 6, 8],
    vco_in: (1_000_000, 2_000_000),
    vco_out: (100_000_000, 500_000_000),
};

const BUS_LIMITS: BusLimits = BusLimits {
    hclk: CK_SYS_MAX,
    pclk1: CK_APB1_MAX,
    pclk2: CK_APB2_MAX,
};

pub trait RcuExt {
    fn constrain(self) -> Rcu;
}

impl RcuExt for RCU {
    fn constrain(self) -> Rcu {
        let regs = self.registers();
        Rcu {
            ahb1: AHB1::new(regs),
            ahb2: AHB2::new(regs),
            apb1: APB1::new(regs),
            apb2: APB2::new(regs),
            cfgr: CFGR {
                regs,
                hxtal: None,
                bypass: false,
                sysclk: None,
                hclk: None,
                pclk1: None,
                pclk2: None,
            },
        }
    }
}

impl RCU {
    /// Derives the running clock frequencies from the RCU registers
    pub fn clocks(&self, hxtal: Hertz) -> Clocks {
        read_clocks(&self.registers(), hxtal)
    }

    /// Starts the IRC32K that clocks the free watchdog
    pub fn enable_irc32k(&mut self) -> Result<(), Error> {
        let regs = self.registers();
        regs.rstsck.modify(RSTSCK::IRC32KEN::SET);
        wait_for(STARTUP_BUDGET, || regs.rstsck.is_set(RSTSCK::IRC32KSTB))
            .map_err(|_| Error::Timeout(Stage::Internal))
    }
}

/// Constrained RCU peripheral
pub struct Rcu {
    pub ahb1: AHB1,
    pub ahb2: AHB2,
    pub apb1: APB1,
    pub apb2: APB2,
    pub cfgr: CFGR,
}

/// PLLP output for a PLL configuration
///
/// `p_bits` selects a divider of 2, 4, 6 or 8.
pub fn pll_sysclk(src: u32, psc: u32, n: u32, p_bits: u32) -> u32 {
    if psc == 0 {
        return 0;
    }
    let div = u64::from(psc) * u64::from((p_bits + 1) * 2);
    (u64::from(src) * u64::from(n) / div) as u32
}

pub fn read_clocks(rcu: &RcuRegisters, hxtal: Hertz) -> Clocks {
    let sysclk = match rcu.cfg0.read_as_enum(CFG0::SCSS) {
        Some(CFG0::SCSS::Value::HXTAL) => hxtal.0,
        Some(CFG0::SCSS::Value::PLLP) => {
            let src = match rcu.pll.read_as_enum(PLL::PLLSEL) {
                Some(PLL::PLLSEL::Value::HXTAL) => hxtal.0,
                _ => IRC16M.0,
            };
            pll_sysclk(
                src,
                rcu.pll.read(PLL::PLLPSC),
                rcu.pll.read(PLL::PLLN),
                rcu.pll.read(PLL::PLLP),
            )
        }
        _ => IRC16M.0,
    };
    decode_buses(
        sysclk,
        rcu.cfg0.read(CFG0::AHBPSC),
        rcu.cfg0.read(CFG0::APB1PSC),
        rcu.cfg0.read(CFG0::APB2PSC),
    )
}

/// Flash wait states for an AHB frequency
pub const fn wait_states(hclk: u32) -> u32 {
    hclk.saturating_sub(1) / 30_000_000
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Plan {
    /// `(psc, n, p, q)`
    pll: Option<(u32, u32, u32, u32)>,
    bits: (u32, u32, u32),
    wait_states: u32,
    high_drive: bool,
    clocks: Clocks,
}

/// Clock configuration builder
pub struct CFGR {
    regs: StaticRef<RcuRegisters>,
    hxtal: Option<Hertz>,
    bypass: bool,
    sysclk: Option<Hertz>,
    hclk: Option<Hertz>,
    pclk1: Option<Hertz>,
    pclk2: Option<Hertz>,
}

impl CFGR {
    /// Uses the external crystal instead of the IRC16M
    pub fn use_hxtal<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hxtal = Some(freq.into());
        self
    }

    /// HXTAL is an external clock, not a crystal
    pub fn bypass_hxtal(mut self) -> Self {
        self.bypass = true;
        self
    }

    pub fn sysclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.sysclk = Some(freq.into());
        self
    }

    pub fn hclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hclk = Some(freq.into());
        self
    }

    pub fn pclk1<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk1 = Some(freq.into());
        self
    }

    pub fn pclk2<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.pclk2 = Some(freq.into());
        self
    }

    fn plan(&self) -> Result<Plan, Error> {
        let src = self.hxtal.unwrap_or(IRC16M).0;
        let sysclk = self.sysclk.map_or(src, |f| f.0);
        if sysclk > CK_SYS_MAX {
            return Err(Error::PllUnreachable);
        }
        let pll = if sysclk == src {
            None
        } else {
            let f = pll_search(src, sysclk, &PLL_LIMITS)?;
            let q = ((f.vco(src) + 47_999_999) / 48_000_000).clamp(2, 15);
            Some((f.m, f.n, f.p, q))
        };
        let buses = bus_plan(
            sysclk,
            self.hclk.map(|f| f.0),
            self.pclk1.map(|f| f.0),
            self.pclk2.map(|f| f.0),
            &BUS_LIMITS,
        )?;
        Ok(Plan {
            pll,
            bits: buses.bits(),
            wait_states: wait_states(buses.clocks.hclk().0),
            high_drive: sysclk > HIGH_DRIVE_THRESHOLD,
            clocks: buses.clocks,
        })
    }

    /// Applies the clock configuration and returns the frozen frequencies
    pub fn freeze(self, fmc: &super::FMC, pmu: &super::PMU) -> Result<Clocks, Error> {
        let plan = self.plan()?;
        let rcu = self.regs;

        if self.hxtal.is_some() {
            rcu.ctl.modify(CTL::HXTALBPS.val(self.bypass.into()));
            rcu.ctl.modify(CTL::HXTALEN::SET);
            wait_for(STARTUP_BUDGET, || rcu.ctl.is_set(CTL::HXTALSTB))
                .map_err(|_| Error::Timeout(Stage::External))?;
        } else {
            rcu.ctl.modify(CTL::IRC16MEN::SET);
            wait_for(STARTUP_BUDGET, || rcu.ctl.is_set(CTL::IRC16MSTB))
                .map_err(|_| Error::Timeout(Stage::Internal))?;
        }

        fmc.registers().ws.modify(WS::WSCNT.val(plan.wait_states));

        let (ahb, apb1, apb2) = plan.bits;
        rcu.cfg0.modify(CFG0::AHBPSC.val(ahb) + CFG0::APB1PSC.val(apb1) + CFG0::APB2PSC.val(apb2));

        let scs = if let Some((psc, n, p, q)) = plan.pll {
            let sel = if self.hxtal.is_some() {
                PLL::PLLSEL::HXTAL
            } else {
                PLL::PLLSEL::IRC16M
            };
            rcu.pll.write(
                PLL::PLLPSC.val(psc)
                    + PLL::PLLN.val(n)
                    + PLL::PLLP.val(p / 2 - 1)
                    + PLL::PLLQ.val(q)
                    + sel,
            );
            rcu.ctl.modify(CTL::PLLEN::SET);
            wait_for(STARTUP_BUDGET, || rcu.ctl.is_set(CTL::PLLSTB))
                .map_err(|_| Error::Timeout(Stage::Pll))?;

            if plan.high_drive {
                clocks::GateBus::gate(&mut APB1::new(rcu), PMUEN, true);
                enable_high_drive(&pmu.registers())?;
            }
            CFG0::SCS::Value::PLLP as u32
        } else if self.hxtal.is_some() {
            CFG0::SCS::Value::HXTAL as u32
        } else {
            CFG0::SCS::Value::IRC16M as u32
        };

        rcu.cfg0.modify(CFG0::SCS.val(scs));
        wait_for(STARTUP_BUDGET, || rcu.cfg0.read(CFG0::SCSS) == scs)
            .map_err(|_| Error::Timeout(Stage::Switch))?;

        Ok(plan.clocks)
    }
}

/// Enables the high-drive mode, then switches the core domain to it
fn enable_high_drive(pmu: &PmuRegisters) -> Result<(), Error> {
    pmu.ctl.modify(PMU_CTL::HDEN::SET);
    wait_for(STARTUP_BUDGET, || pmu.cs.is_set(PMU_CS::HDRF))
        .map_err(|_| Error::Timeout(Stage::Power))?;
    pmu.ctl.modify(PMU_CTL::HDS::SET);
    wait_for(STARTUP_BUDGET, || pmu.cs.is_set(PMU_CS::HDSRF))
        .map_err(|_| Error::Timeout(Stage::Power))
}

#[cfg(test)]
mod tests {
    use super::super::{FMC, PMU};
    use super::*;
    use crate::clocks::{Enable, GateBus};
    use crate::reg::mock;
    use crate::time::U32Ext;
    use core::mem::offset_of;

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(RcuRegisters, apb1rst), 0x20);
        assert_eq!(offset_of!(RcuRegisters, ahb1en), 0x30);
        assert_eq!(offset_of!(RcuRegisters, apb2en), 0x44);
        assert_eq!(offset_of!(RcuRegisters, rstsck), 0x74);
        assert_eq!(offset_of!(PmuRegisters, cs), 0x04);
    }

    #[test]
    fn readback_of_the_eval_board_setup() {
        let regs = mock::block::<RcuRegisters>();
        assert_eq!(read_clocks(&regs, HXTAL_VALUE).sysclk(), IRC16M);

        // HXTAL 25 MHz / 25 * 400 / 2, AHB /1, APB1 /4, APB2 /2
        mock::poke(regs, 0x04, 25 | 400 << 6 | 1 << 22 | 9 << 24);
        mock::poke(regs, 0x08, 0b10 << 2 | 0b101 << 10 | 0b100 << 13);
        let clocks = read_clocks(&regs, HXTAL_VALUE);
        assert_eq!(clocks.sysclk(), Hertz(200_000_000));
        assert_eq!(clocks.pclk1(), Hertz(50_000_000));
        assert_eq!(clocks.pclk2(), Hertz(100_000_000));
    }

    fn cfgr() -> CFGR {
        unsafe { RCU::at(mock::block()) }.constrain().cfgr
    }

    #[test]
    fn plan_for_200_mhz() {
        let plan = cfgr().use_hxtal(25.mhz()).sysclk(200.mhz()).plan().unwrap();
        let (psc, n, p, _) = plan.pll.unwrap();
        assert_eq!(pll_sysclk(25_000_000, psc, n, p / 2 - 1), 200_000_000);
        assert!(plan.high_drive);
        assert_eq!(plan.bits, (0b0000, 0b101, 0b100));
        assert_eq!(plan.wait_states, 6);

        let plan = cfgr().use_hxtal(25.mhz()).sysclk(120.mhz()).plan().unwrap();
        assert!(!plan.high_drive);
        assert_eq!(plan.clocks.pclk1(), Hertz(30_000_000));
        assert_eq!(plan.clocks.pclk2(), Hertz(60_000_000));
    }

    #[test]
    fn freeze_enables_high_drive() {
        let rcu = mock::block::<RcuRegisters>();
        let pmu = unsafe { PMU::at(mock::block()) };
        let fmc = unsafe { FMC::at(mock::block()) };
        // HXTALSTB, PLLSTB, SCSS = PLLP and both high-drive flags already up
        mock::poke(rcu, 0x00, 1 << 17 | 1 << 25);
        mock::poke(rcu, 0x08, 0b10 << 2);
        mock::poke(pmu.registers(), 0x04, 1 << 16 | 1 << 17);

        let cfgr = unsafe { RCU::at(rcu) }.constrain().cfgr;
        let clocks = cfgr.use_hxtal(25.mhz()).sysclk(200.mhz()).freeze(&fmc, &pmu).unwrap();
        assert_eq!(clocks.sysclk(), Hertz(200_000_000));
        assert_eq!(mock::peek(pmu.registers(), 0x00), 1 << 16 | 1 << 17);
        assert_eq!(mock::peek(fmc.registers(), 0x00), 6);
        assert_eq!(mock::peek(rcu, 0x40), 1 << PMUEN);
        assert_eq!(mock::peek(rcu, 0x08) & 0b11, 0b10);
    }

    #[test]
    fn high_drive_that_never_settles() {
        let rcu = mock::block::<RcuRegisters>();
        let pmu = unsafe { PMU::at(mock::block()) };
        let fmc = unsafe { FMC::at(mock::block()) };
        mock::poke(rcu, 0x00, 1 << 17 | 1 << 25);
        let cfgr = unsafe { RCU::at(rcu) }.constrain().cfgr;
        assert_eq!(
            cfgr.use_hxtal(25.mhz()).sysclk(200.mhz()).freeze(&fmc, &pmu),
            Err(Error::Timeout(Stage::Power))
        );
    }

    #[test]
    fn gating_bits() {
        let rcu = mock::block();
        let mut apb2 = APB2::new(rcu);
        USART0::enable(&mut apb2);
        SPI0::enable(&mut apb2);
        assert_eq!(mock::peek(rcu, 0x44), 1 << 4 | 1 << 12);
        assert!(apb2.is_gated_on(4));
        USART0::disable(&mut apb2);
        assert!(!USART0::is_enabled(&apb2));
    }
}
