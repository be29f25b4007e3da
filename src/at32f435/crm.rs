// Copyright 2026 The m4-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Clock and reset manager
//!
//! Bring-up follows the order the core needs at 288 MHz: LDO at 1.3 V and the
//! flash divider first, then the oscillator and the PLL, and the final switch
//! to the PLL with the automatic frequency step engaged.

use super::{
    CRC, CRM, GPIOA, GPIOB, GPIOC, GPIOD, GPIOE, GPIOF, GPIOG, GPIOH, SCFG, SPI1, SPI2, SPI3,
    UART4, UART5, USART1, USART2, USART3, USART6, WWDT,
};
use crate::clocks::{
    self, bus_plan, decode_buses, pll_search, BusLimits, Clocks, Error, GateBus, PllLimits,
    Stage,
};
use crate::reg::{
    register_bitfields, wait_for, Peripheral, ReadWrite, ReadWriteable, Readable, StaticRef,
    Writeable,
};
use crate::time::Hertz;

/// High speed internal clock, as fed to the PLL
pub const HICK: Hertz = Hertz(8_000_000);
/// HICK with the divider bypassed, selectable as system clock
pub const HICK_48M: Hertz = Hertz(48_000_000);
/// Crystal of the AT-START-F435
pub const HEXT_VALUE: Hertz = Hertz(8_000_000);
/// Low speed internal clock, clocking the WDT
pub const LICK: Hertz = Hertz(40_000);

pub const SCLK_MAX: u32 = 288_000_000;
pub const APB_MAX: u32 = 144_000_000;
/// Highest flash clock
const FLASH_CLK_MAX: u32 = 104_000_000;
/// System clock above which the switch needs the automatic step
const AUTO_STEP_THRESHOLD: u32 = 108_000_000;

/// PWC clock enable in CRM_APB1EN
const PWCEN: u8 = 28;

const STARTUP_BUDGET: u32 = 0x3000;

register_bitfields![u32,
    CTRL [
        PLLSTBL OFFSET(25) NUMBITS(1) [],
        PLLEN OFFSET(24) NUMBITS(1) [],
        CFDEN OFFSET(19) NUMBITS(1) [],
        HEXTBYPS OFFSET(18) NUMBITS(1) [],
        HEXTSTBL OFFSET(17) NUMBITS(1) [],
        HEXTEN OFFSET(16) NUMBITS(1) [],
        HICKSTBL OFFSET(1) NUMBITS(1) [],
        HICKEN OFFSET(0) NUMBITS(1) []
    ],
    PLLCFG [
        PLLRCS OFFSET(22) NUMBITS(1) [
            HICK = 0,
            HEXT = 1
        ],
        PLL_FR OFFSET(16) NUMBITS(3) [],
        PLL_NS OFFSET(6) NUMBITS(9) [],
        PLL_MS OFFSET(0) NUMBITS(4) []
    ],
    CFG [
        APB2DIV OFFSET(13) NUMBITS(3) [],
        APB1DIV OFFSET(10) NUMBITS(3) [],
        AHBDIV OFFSET(4) NUMBITS(4) [],
        SCLKSTS OFFSET(2) NUMBITS(2) [
            HICK = 0,
            HEXT = 1,
            PLL = 2
        ],
        SCLKSEL OFFSET(0) NUMBITS(2) [
            HICK = 0,
            HEXT = 1,
            PLL = 2
        ]
    ],
    CTRLSTS [
        LICKSTBL OFFSET(1) NUMBITS(1) [],
        LICKEN OFFSET(0) NUMBITS(1) []
    ],
    MISC1 [
        HICK_TO_SCLK OFFSET(14) NUMBITS(1) [],
        HICKDIV OFFSET(12) NUMBITS(1) []
    ],
    MISC2 [
        AUTO_STEP_EN OFFSET(4) NUMBITS(2) [
            Disabled = 0,
            Enabled = 3
        ]
    ],
    LDOOV [
        LDOOVSEL OFFSET(0) NUMBITS(3) [
            V1_2 = 0,
            V1_3 = 1,
            V1_0 = 4
        ]
    ],
    DIVR [
        FDIV OFFSET(0) NUMBITS(2) [
            Div2 = 0,
            Div3 = 1,
            Div4 = 2
        ]
    ]
];

#[repr(C)]
pub struct CrmRegisters {
    ctrl: ReadWrite<u32, CTRL::Register>,
    pllcfg: ReadWrite<u32, PLLCFG::Register>,
    cfg: ReadWrite<u32, CFG::Register>,
    clkint: ReadWrite<u32>,
    ahbrst1: ReadWrite<u32>,
    ahbrst2: ReadWrite<u32>,
    ahbrst3: ReadWrite<u32>,
    _reserved0: [u8; 4],
    apb1rst: ReadWrite<u32>,
    apb2rst: ReadWrite<u32>,
    _reserved1: [u8; 8],
    ahben1: ReadWrite<u32>,
    ahben2: ReadWrite<u32>,
    ahben3: ReadWrite<u32>,
    _reserved2: [u8; 4],
    apb1en: ReadWrite<u32>,
    apb2en: ReadWrite<u32>,
    _reserved3: [u8; 0x2C],
    ctrlsts: ReadWrite<u32, CTRLSTS::Register>,
    _reserved4: [u8; 0x28],
    misc1: ReadWrite<u32, MISC1::Register>,
    misc2: ReadWrite<u32, MISC2::Register>,
}

/// Power controller, only the LDO output voltage
#[repr(C)]
pub struct PwcRegisters {
    _reserved0: [u8; 0x10],
    ldoov: ReadWrite<u32, LDOOV::Register>,
}

/// Flash controller, only the clock divider
#[repr(C)]
pub struct FlashRegisters {
    _reserved0: [u8; 0x60],
    divr: ReadWrite<u32, DIVR::Register>,
}

clocks::buses!(CrmRegisters {
    AHB1 => (en: ahben1, rst: ahbrst1, clk: hclk),
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
    CRC => (AHB1, 12),
    WWDT => (APB1, 11),
    SPI2 => (APB1, 14),
    SPI3 => (APB1, 15),
    USART2 => (APB1, 17),
    USART3 => (APB1, 18),
    UART4 => (APB1, 19),
    UART5 => (APB1, 20),
    USART1 => (APB2, 4),
    USART6 => (APB2, 5),
    SPI1 => (APB2, 12),
    SCFG => (APB2, 14),
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
    CRC => 12,
    WWDT => 11,
    SPI2 => 14,
    SPI3 => 15,
    USART2 => 17,
    USART3 => 18,
    UART4 => 19,
    UART5 => 20,
    USART1 => 4,
    USART6 => 5,
    SPI1 => 12,
    SCFG => 14,
}

const PLL_LIMITS: PllLimits = PllLimits {
    m: (1, 15),
    n: (31, 500),
    p: &[1, 2, 4, 8, 16, 32],
    vco_in: (2_000_000, 16_000_000),
    vco_out: (500_000_000, 1_200_000_000),
};

const BUS_LIMITS: BusLimits = BusLimits {
    hclk: SCLK_MAX,
    pclk1: APB_MAX,
    pclk2: APB_MAX,
};

pub trait CrmExt {
    fn constrain(self) -> Crm;
}

impl CrmExt for CRM {
    fn constrain(self) -> Crm {
        let regs = self.registers();
        Crm {
            ahb1: AHB1::new(regs),
            apb1: APB1::new(regs),
            apb2: APB2::new(regs),
            cfgr: CFGR {
                regs,
                hext: None,
                bypass: false,
                hick_48m: false,
                sclk: None,
                hclk: None,
                pclk1: None,
                pclk2: None,
            },
        }
    }
}

impl CRM {
    /// Derives the running clock frequencies from the CRM registers
    pub fn clocks(&self, hext: Hertz) -> Clocks {
        read_clocks(&self.registers(), hext)
    }

    /// Starts the LICK that clocks the WDT
    pub fn enable_lick(&mut self) -> Result<(), Error> {
        let regs = self.registers();
        regs.ctrlsts.modify(CTRLSTS::LICKEN::SET);
        wait_for(STARTUP_BUDGET, || regs.ctrlsts.is_set(CTRLSTS::LICKSTBL))
            .map_err(|_| Error::Timeout(Stage::Internal))
    }
}

/// Constrained CRM
pub struct Crm {
    pub ahb1: AHB1,
    pub apb1: APB1,
    pub apb2: APB2,
    pub cfgr: CFGR,
}

/// PLL output divider for a `PLL_FR` encoding
pub const fn pll_fr(bits: u32) -> u32 {
    1 << if bits > 5 { 5 } else { bits }
}

/// PLL output for a PLL configuration
pub fn pll_sclk(src: u32, ms: u32, ns: u32, fr_bits: u32) -> u32 {
    if ms == 0 {
        return 0;
    }
    (u64::from(src) * u64::from(ns) / (u64::from(ms) * u64::from(pll_fr(fr_bits)))) as u32
}

pub fn read_clocks(crm: &CrmRegisters, hext: Hertz) -> Clocks {
    let hick = if crm.misc1.is_set(MISC1::HICKDIV) && crm.misc1.is_set(MISC1::HICK_TO_SCLK) {
        HICK_48M.0
    } else {
        HICK.0
    };
    let sclk = match crm.cfg.read_as_enum(CFG::SCLKSTS) {
        Some(CFG::SCLKSTS::Value::HEXT) => hext.0,
        Some(CFG::SCLKSTS::Value::PLL) => {
            let src = match crm.pllcfg.read_as_enum(PLLCFG::PLLRCS) {
                Some(PLLCFG::PLLRCS::Value::HEXT) => hext.0,
                _ => HICK.0,
            };
            pll_sclk(
                src,
                crm.pllcfg.read(PLLCFG::PLL_MS),
                crm.pllcfg.read(PLLCFG::PLL_NS),
                crm.pllcfg.read(PLLCFG::PLL_FR),
            )
        }
        _ => hick,
    };
    decode_buses(
        sclk,
        crm.cfg.read(CFG::AHBDIV),
        crm.cfg.read(CFG::APB1DIV),
        crm.cfg.read(CFG::APB2DIV),
    )
}

/// Flash clock divider keeping the flash at or below 104 MHz
///
/// Returns the `FDIV` encoding.
pub fn flash_divider(hclk: u32) -> u32 {
    let div = if hclk <= 2 * FLASH_CLK_MAX {
        DIVR::FDIV::Value::Div2
    } else if hclk <= 3 * FLASH_CLK_MAX {
        DIVR::FDIV::Value::Div3
    } else {
        DIVR::FDIV::Value::Div4
    };
    div as u32
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Plan {
    /// `(ms, ns, fr)`
    pll: Option<(u32, u32, u32)>,
    bits: (u32, u32, u32),
    auto_step: bool,
    clocks: Clocks,
}

/// Clock configuration builder
pub struct CFGR {
    regs: StaticRef<CrmRegisters>,
    hext: Option<Hertz>,
    bypass: bool,
    hick_48m: bool,
    sclk: Option<Hertz>,
    hclk: Option<Hertz>,
    pclk1: Option<Hertz>,
    pclk2: Option<Hertz>,
}

impl CFGR {
    pub fn use_hext<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.hext = Some(freq.into());
        self
    }

    pub fn bypass_hext(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Runs the system clock straight from the undivided 48 MHz HICK
    ///
    /// Only applies when neither HEXT nor the PLL are used.
    pub fn hick_48mhz(mut self) -> Self {
        self.hick_48m = true;
        self
    }

    pub fn sysclk<F: Into<Hertz>>(mut self, freq: F) -> Self {
        self.sclk = Some(freq.into());
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

    /// Frequency of the source selected without the PLL
    fn direct(&self) -> u32 {
        match self.hext {
            Some(hext) => hext.0,
            None if self.hick_48m => HICK_48M.0,
            None => HICK.0,
        }
    }

    fn plan(&self) -> Result<Plan, Error> {
        let direct = self.direct();
        let sclk = self.sclk.map_or(direct, |f| f.0);
        if sclk > SCLK_MAX {
            return Err(Error::PllUnreachable);
        }
        let pll = if sclk == direct {
            None
        } else {
            let src = self.hext.unwrap_or(HICK).0;
            let f = pll_search(src, sclk, &PLL_LIMITS)?;
            Some((f.m, f.n, f.p))
        };
        let buses = bus_plan(
            sclk,
            self.hclk.map(|f| f.0),
            self.pclk1.map(|f| f.0),
            self.pclk2.map(|f| f.0),
            &BUS_LIMITS,
        )?;
        Ok(Plan {
            pll,
            bits: buses.bits(),
            auto_step: sclk > AUTO_STEP_THRESHOLD,
            clocks: buses.clocks,
        })
    }

    /// Applies the clock configuration and returns the frozen frequencies
    pub fn freeze(self, flash: &super::FLASH, pwc: &super::PWC) -> Result<Clocks, Error> {
        let plan = self.plan()?;
        let crm = self.regs;

        APB1::new(crm).gate(PWCEN, true);
        pwc.registers().ldoov.write(LDOOV::LDOOVSEL::V1_3);
        flash
            .registers()
            .divr
            .write(DIVR::FDIV.val(flash_divider(plan.clocks.hclk().0)));

        if self.hext.is_some() {
            crm.ctrl.modify(CTRL::HEXTBYPS.val(self.bypass.into()));
            crm.ctrl.modify(CTRL::HEXTEN::SET);
            wait_for(STARTUP_BUDGET, || crm.ctrl.is_set(CTRL::HEXTSTBL))
                .map_err(|_| Error::Timeout(Stage::External))?;
        } else {
            crm.ctrl.modify(CTRL::HICKEN::SET);
            wait_for(STARTUP_BUDGET, || crm.ctrl.is_set(CTRL::HICKSTBL))
                .map_err(|_| Error::Timeout(Stage::Internal))?;
            if self.hick_48m && plan.pll.is_none() {
                crm.misc1.modify(MISC1::HICKDIV::SET + MISC1::HICK_TO_SCLK::SET);
            }
        }

        let sel = if let Some((ms, ns, fr)) = plan.pll {
            let rcs = if self.hext.is_some() {
                PLLCFG::PLLRCS::HEXT
            } else {
                PLLCFG::PLLRCS::HICK
            };
            crm.pllcfg.write(
                PLLCFG::PLL_MS.val(ms)
                    + PLLCFG::PLL_NS.val(ns)
                    + PLLCFG::PLL_FR.val(fr.trailing_zeros())
                    + rcs,
            );
            crm.ctrl.modify(CTRL::PLLEN::SET);
            wait_for(STARTUP_BUDGET, || crm.ctrl.is_set(CTRL::PLLSTBL))
                .map_err(|_| Error::Timeout(Stage::Pll))?;
            CFG::SCLKSEL::Value::PLL as u32
        } else if self.hext.is_some() {
            CFG::SCLKSEL::Value::HEXT as u32
        } else {
            CFG::SCLKSEL::Value::HICK as u32
        };

        let (ahb, apb1, apb2) = plan.bits;
        crm.cfg.modify(CFG::AHBDIV.val(ahb) + CFG::APB1DIV.val(apb1) + CFG::APB2DIV.val(apb2));

        if plan.auto_step {
            crm.misc2.modify(MISC2::AUTO_STEP_EN::Enabled);
        }
        crm.cfg.modify(CFG::SCLKSEL.val(sel));
        let switched = wait_for(STARTUP_BUDGET, || crm.cfg.read(CFG::SCLKSTS) == sel)
            .map_err(|_| Error::Timeout(Stage::Switch));
        crm.misc2.modify(MISC2::AUTO_STEP_EN::Disabled);
        switched?;

        Ok(plan.clocks)
    }
}
